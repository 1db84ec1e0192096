//! Role title → dashboard route resolution.
//!
//! Role titles are free text maintained in the `groups` table, so routing
//! matches on lowercase fragments rather than exact names. Rules are checked
//! in order and the first rule whose fragments all occur in the title wins.

use serde::{Deserialize, Serialize};

/// Path of the generic dashboard used when no rule matches.
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";

/// Identifier of the dashboard view a front end should render.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DashboardView {
    #[serde(rename = "AdminDashboard")]
    Admin,
    #[serde(rename = "EmployerDashboard")]
    Employer,
    #[serde(rename = "RegistrarDashboard")]
    Registrar,
    #[serde(rename = "CommissionerDashboard")]
    Commissioner,
    #[serde(rename = "PaymentDashboard")]
    Payment,
    #[serde(rename = "PCODashboard")]
    ProvincialClaimsOfficer,
    /// Role-specific path with no dedicated view; rendered generically.
    #[serde(rename = "DynamicDashboard")]
    Dynamic,
    #[serde(rename = "DefaultDashboard")]
    Default,
}

impl DashboardView {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardView::Admin => "AdminDashboard",
            DashboardView::Employer => "EmployerDashboard",
            DashboardView::Registrar => "RegistrarDashboard",
            DashboardView::Commissioner => "CommissionerDashboard",
            DashboardView::Payment => "PaymentDashboard",
            DashboardView::ProvincialClaimsOfficer => "PCODashboard",
            DashboardView::Dynamic => "DynamicDashboard",
            DashboardView::Default => "DefaultDashboard",
        }
    }
}

impl std::fmt::Display for DashboardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved dashboard destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardRoute {
    pub path: &'static str,
    pub view: DashboardView,
}

impl DashboardRoute {
    pub const DEFAULT: DashboardRoute = DashboardRoute {
        path: DEFAULT_DASHBOARD_PATH,
        view: DashboardView::Default,
    };

    pub fn is_admin(&self) -> bool {
        self.view == DashboardView::Admin
    }
}

/// Serializable form of [`DashboardRoute`] sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardInfo {
    pub path: String,
    pub view: DashboardView,
}

impl From<DashboardRoute> for DashboardInfo {
    fn from(route: DashboardRoute) -> Self {
        Self {
            path: route.path.to_string(),
            view: route.view,
        }
    }
}

struct RouteRule {
    fragments: &'static [&'static str],
    route: DashboardRoute,
}

const fn rule(fragments: &'static [&'static str], path: &'static str, view: DashboardView) -> RouteRule {
    RouteRule {
        fragments,
        route: DashboardRoute { path, view },
    }
}

// Order matters: compound titles ("Deputy Registrar", "Chief Commissioner")
// must be tested before the bare fragment they contain.
const ROUTE_RULES: &[RouteRule] = &[
    rule(&["admin"], "/admin", DashboardView::Admin),
    rule(&["deputy", "registrar"], "/deputy-registrar-dashboard", DashboardView::Dynamic),
    rule(&["registrar"], "/registrar-dashboard", DashboardView::Registrar),
    rule(&["chief", "commissioner"], "/chief-commissioner-dashboard", DashboardView::Dynamic),
    rule(&["commissioner"], "/commissioner-dashboard", DashboardView::Commissioner),
    rule(&["provincial", "claims"], "/pco-dashboard", DashboardView::ProvincialClaimsOfficer),
    rule(&["pco"], "/pco-dashboard", DashboardView::ProvincialClaimsOfficer),
    rule(&["claims", "manager"], "/claims-manager-dashboard", DashboardView::Dynamic),
    rule(&["employer"], "/employer-dashboard", DashboardView::Employer),
    rule(&["payment"], "/payment-dashboard", DashboardView::Payment),
    rule(&["data", "entry"], "/data-entry-dashboard", DashboardView::Dynamic),
    rule(&["tribunal"], "/tribunal-dashboard", DashboardView::Dynamic),
    rule(&["insurance"], "/insurance-dashboard", DashboardView::Dynamic),
    rule(&["statistic"], "/statistics-dashboard", DashboardView::Dynamic),
    rule(&["legal"], "/legal-dashboard", DashboardView::Dynamic),
    rule(&["worker"], "/worker-dashboard", DashboardView::Dynamic),
];

/// Map a role title to its dashboard. Total and deterministic: `None`,
/// blank, or unmatched titles all yield [`DashboardRoute::DEFAULT`].
pub fn resolve_dashboard(role: Option<&str>) -> DashboardRoute {
    let Some(role) = role.map(str::trim).filter(|r| !r.is_empty()) else {
        return DashboardRoute::DEFAULT;
    };
    let lowered = role.to_lowercase();

    ROUTE_RULES
        .iter()
        .find(|rule| rule.fragments.iter().all(|f| lowered.contains(f)))
        .map(|rule| rule.route)
        .unwrap_or(DashboardRoute::DEFAULT)
}

/// Map a routing-surface path to the view that renders it. Paths without a
/// dedicated view (including unknown ones) render the dynamic dashboard.
pub fn view_for_path(path: &str) -> DashboardView {
    let path = path.trim();
    if path == DEFAULT_DASHBOARD_PATH {
        return DashboardView::Default;
    }
    ROUTE_RULES
        .iter()
        .find(|rule| rule.route.path == path)
        .map(|rule| rule.route.view)
        .unwrap_or(DashboardView::Dynamic)
}

/// Every distinct path a role can resolve to, in rule order.
pub fn known_dashboard_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = Vec::with_capacity(ROUTE_RULES.len() + 1);
    for rule in ROUTE_RULES {
        if !paths.contains(&rule.route.path) {
            paths.push(rule.route.path);
        }
    }
    paths.push(DEFAULT_DASHBOARD_PATH);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path_of(role: &str) -> &'static str {
        resolve_dashboard(Some(role)).path
    }

    #[test]
    fn admin_titles_route_to_admin() {
        assert_eq!(resolve_dashboard(Some("OWC Admin")).path, "/admin");
        assert_eq!(resolve_dashboard(Some("OWC Admin")).view, DashboardView::Admin);
        assert_eq!(path_of("system administrator"), "/admin");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(path_of("REGISTRAR"), "/registrar-dashboard");
        assert_eq!(path_of("employer"), "/employer-dashboard");
        assert_eq!(path_of("Payment Officer"), "/payment-dashboard");
    }

    #[test]
    fn compound_titles_beat_their_parts() {
        assert_eq!(path_of("Deputy Registrar"), "/deputy-registrar-dashboard");
        assert_eq!(path_of("Registrar"), "/registrar-dashboard");
        assert_eq!(path_of("Chief Commissioner"), "/chief-commissioner-dashboard");
        assert_eq!(path_of("Commissioner"), "/commissioner-dashboard");
    }

    #[test]
    fn provincial_claims_officer_needs_both_fragments() {
        let route = resolve_dashboard(Some("Provincial Claims Officer"));
        assert_eq!(route.path, "/pco-dashboard");
        assert_eq!(route.view, DashboardView::ProvincialClaimsOfficer);
        assert_eq!(path_of("PCO"), "/pco-dashboard");
        assert_eq!(path_of("Provincial Liaison"), DEFAULT_DASHBOARD_PATH);
    }

    #[test]
    fn unmapped_role_paths_use_dynamic_view() {
        let route = resolve_dashboard(Some("Deputy Registrar"));
        assert_eq!(route.view, DashboardView::Dynamic);
        assert_eq!(resolve_dashboard(Some("Tribunal Member")).view, DashboardView::Dynamic);
    }

    #[test]
    fn missing_blank_and_unknown_roles_use_default() {
        assert_eq!(resolve_dashboard(None), DashboardRoute::DEFAULT);
        assert_eq!(resolve_dashboard(Some("")), DashboardRoute::DEFAULT);
        assert_eq!(resolve_dashboard(Some("   ")), DashboardRoute::DEFAULT);
        assert_eq!(resolve_dashboard(Some("User")), DashboardRoute::DEFAULT);
        assert_eq!(resolve_dashboard(Some("zzz-unmatched")).view, DashboardView::Default);
    }

    #[test]
    fn resolved_paths_are_fixed_points() {
        for path in known_dashboard_paths() {
            assert_eq!(path_of(path), path, "path {path} should resolve to itself");
        }
    }

    #[test]
    fn view_for_path_agrees_with_resolver() {
        for rule in ROUTE_RULES {
            assert_eq!(view_for_path(rule.route.path), rule.route.view);
        }
        assert_eq!(view_for_path("/dashboard"), DashboardView::Default);
        assert_eq!(view_for_path("/something-else"), DashboardView::Dynamic);
    }

    #[test]
    fn view_serializes_as_identifier() {
        let info = DashboardInfo::from(resolve_dashboard(Some("Provincial Claims Officer")));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["path"], "/pco-dashboard");
        assert_eq!(json["view"], "PCODashboard");
        assert_eq!(DashboardView::Default.to_string(), "DefaultDashboard");
    }
}
