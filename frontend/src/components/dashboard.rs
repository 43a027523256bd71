use impulstrip_admin_shared::models::{DashboardStats, PageQuery, WaitlistEntry, WaitlistPage};
use impulstrip_admin_shared::protocol::{DashboardStatsRequest, ListWaitlistRequest};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::{logout, use_auth};
use crate::components::icons::*;

const PAGE_SIZE: u32 = 10;

#[component]
fn StatCard(title: &'static str, value: Signal<u64>) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class="stat-value text-primary">{move || value.get()}</div>
        </div>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let features = auth.features;

    let (stats, set_stats) = signal(DashboardStats::default());
    let (waitlist, set_waitlist) = signal(WaitlistPage::default());
    let (page, set_page) = signal(1u32);
    let (loading, set_loading) = signal(false);
    let (notification, set_notification) = signal(Option::<String>::None);

    let load_stats = move || {
        let api = auth.api();
        spawn_local(async move {
            match api.send(&DashboardStatsRequest).await {
                Ok(data) => set_stats.set(data),
                Err(e) => set_notification.set(Some(format!("加载统计失败: {}", e))),
            }
        });
    };

    let load_waitlist = move |page: u32| {
        if !features.waitlist {
            return;
        }
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            let req = ListWaitlistRequest(PageQuery::new(page, PAGE_SIZE));
            match api.send(&req).await {
                Ok(data) => set_waitlist.set(data),
                Err(e) => set_notification.set(Some(format!("加载候补名单失败: {}", e))),
            }
            set_loading.set(false);
        });
    };

    // 初始加载与翻页
    Effect::new(move |_| {
        let page = page.get();
        load_waitlist(page);
    });
    Effect::new(move |_| load_stats());

    let refresh = move |_| {
        load_stats();
        load_waitlist(page.get_untracked());
    };

    let on_logout = move |_| logout(&auth);

    // 3秒后清除通知
    Effect::new(move |_| {
        if notification.get().is_some() {
            set_timeout(
                move || set_notification.set(None),
                std::time::Duration::from_secs(3),
            );
        }
    });

    let total_pages = move || waitlist.with(|w| w.total_pages.max(1));
    let user_name = move || auth.state.get().display_name().unwrap_or_else(|| "admin".to_string());

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                <Show when=move || notification.get().is_some()>
                    <div class="toast toast-top toast-end z-50">
                        <div class="alert alert-error shadow-lg">
                            <span>{move || notification.get().unwrap_or_default()}</span>
                        </div>
                    </div>
                </Show>

                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <a class="btn btn-ghost text-xl">"ImpulsTrip 管理后台"</a>
                        <span class="badge badge-neutral hidden md:inline-flex">{user_name}</span>
                        <Show when=move || auth.state.get().is_loading>
                            <span class="badge badge-ghost gap-1 text-xs">
                                <span class="loading loading-spinner loading-xs"></span>
                                "正在验证会话"
                            </span>
                        </Show>
                    </div>
                    <div class="flex-none gap-2">
                        <button on:click=refresh disabled=move || loading.get() class="btn btn-ghost btn-circle">
                            <RefreshCw attr:class=move || if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                        </button>
                        <button on:click=on_logout class="btn btn-outline btn-error gap-2">
                            <LogOut attr:class="h-4 w-4" /> "退出登录"
                        </button>
                    </div>
                </div>

                <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                    <StatCard title="候补名单" value=Signal::derive(move || stats.get().waitlist_count) />
                    <StatCard title="今日新增" value=Signal::derive(move || stats.get().new_today_count) />
                    <Show when=move || features.blog>
                        <StatCard title="博客文章" value=Signal::derive(move || stats.get().blog_post_count) />
                    </Show>
                    <Show when=move || features.newsletter>
                        <StatCard title="订阅人数" value=Signal::derive(move || stats.get().newsletter_count) />
                    </Show>
                </div>

                <Show when=move || features.waitlist>
                    <div class="card bg-base-100 shadow-xl">
                        <div class="card-body p-0">
                            <div class="flex items-center justify-between p-6 pb-2">
                                <div class="flex items-center gap-2">
                                    <Users attr:class="h-5 w-5 text-primary" />
                                    <h3 class="card-title">"候补名单"</h3>
                                </div>
                                <span class="text-base-content/70 text-sm">
                                    {move || format!("共 {} 人", waitlist.with(|w| w.total))}
                                </span>
                            </div>

                            <div class="overflow-x-auto w-full">
                                <table class="table table-zebra w-full">
                                    <thead>
                                        <tr>
                                            <th>"邮箱"</th>
                                            <th>"姓名"</th>
                                            <th class="hidden md:table-cell">"加入时间"</th>
                                        </tr>
                                    </thead>
                                    <tbody>
                                        <Show when=move || waitlist.with(|w| w.users.is_empty()) && !loading.get()>
                                            <tr>
                                                <td colspan="3" class="text-center py-8 text-base-content/50">
                                                    "暂无数据"
                                                </td>
                                            </tr>
                                        </Show>
                                        <For
                                            each=move || waitlist.get().users
                                            key=|entry: &WaitlistEntry| entry.id.clone()
                                            children=move |entry| {
                                                view! {
                                                    <tr>
                                                        <td class="font-mono text-sm">{entry.email}</td>
                                                        <td>{entry.name.unwrap_or_default()}</td>
                                                        <td class="hidden md:table-cell text-sm opacity-70">
                                                            {entry.created_at.unwrap_or_default()}
                                                        </td>
                                                    </tr>
                                                }
                                            }
                                        />
                                    </tbody>
                                </table>
                            </div>

                            <div class="flex justify-center p-4">
                                <div class="join">
                                    <button
                                        class="join-item btn btn-sm"
                                        disabled=move || page.get() <= 1
                                        on:click=move |_| set_page.update(|p| *p = p.saturating_sub(1).max(1))
                                    >"«"</button>
                                    <button class="join-item btn btn-sm">
                                        {move || format!("{} / {}", page.get(), total_pages())}
                                    </button>
                                    <button
                                        class="join-item btn btn-sm"
                                        disabled=move || u64::from(page.get()) >= total_pages()
                                        on:click=move |_| set_page.update(|p| *p += 1)
                                    >"»"</button>
                                </div>
                            </div>
                        </div>
                    </div>
                </Show>
            </div>
        </div>
    }
}
