//! 路由表与认证守卫
//!
//! 纯逻辑层，不依赖 DOM。前端的 History 路由器基于这里的定义做导航。

use std::fmt::Display;

/// 应用路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 首页：登录入口与队伍日历
    #[default]
    Home,
    /// 每日训练记录
    Log,
    /// 个人资料
    Profile,
    /// 教练查看队伍周汇总
    TeamSummaries,
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由，忽略查询串、片段与末尾的 `/`
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/log" => Self::Log,
            "/profile" => Self::Profile,
            "/team-summaries" => Self::TeamSummaries,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Log => "/log",
            Self::Profile => "/profile",
            Self::TeamSummaries => "/team-summaries",
            Self::NotFound => "/404",
        }
    }

    /// **守卫规则：该路由是否需要已登录的应用用户**
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Log | Self::Profile | Self::TeamSummaries)
    }

    /// 未认证访问受保护路由时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Home
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Log => "Training Log",
            Self::Profile => "Profile",
            Self::TeamSummaries => "Team Summaries",
            Self::NotFound => "Not Found",
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

/// 导航守卫：返回实际应进入的路由
pub fn guard(target: AppRoute, is_authenticated: bool) -> AppRoute {
    if target.requires_auth() && !is_authenticated {
        log::debug!("[Router] {} 需要登录，重定向到首页", target);
        AppRoute::auth_failure_redirect()
    } else {
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/log"), AppRoute::Log);
        assert_eq!(AppRoute::from_path("/log/"), AppRoute::Log);
        assert_eq!(AppRoute::from_path("/profile?tab=1"), AppRoute::Profile);
        assert_eq!(AppRoute::from_path("/team-summaries#top"), AppRoute::TeamSummaries);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn test_paths_round_trip_for_known_routes() {
        for route in [
            AppRoute::Home,
            AppRoute::Log,
            AppRoute::Profile,
            AppRoute::TeamSummaries,
        ] {
            assert_eq!(AppRoute::from_path(route.to_path()), route);
        }
        assert_eq!(AppRoute::TeamSummaries.to_string(), "/team-summaries");
    }

    #[test]
    fn test_guard_redirects_unauthenticated() {
        assert_eq!(guard(AppRoute::Log, false), AppRoute::Home);
        assert_eq!(guard(AppRoute::Profile, false), AppRoute::Home);
        assert_eq!(guard(AppRoute::TeamSummaries, false), AppRoute::Home);
        assert_eq!(guard(AppRoute::Home, false), AppRoute::Home);
        assert_eq!(guard(AppRoute::NotFound, false), AppRoute::NotFound);
    }

    #[test]
    fn test_guard_allows_authenticated() {
        assert_eq!(guard(AppRoute::Log, true), AppRoute::Log);
        assert_eq!(guard(AppRoute::TeamSummaries, true), AppRoute::TeamSummaries);
    }
}
