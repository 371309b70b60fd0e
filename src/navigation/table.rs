use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    models::RouteBinding,
    navigation::path::join,
    roles::{ResolvedRole, Role, RoleRegistry},
};

/// PageSpec
///
/// One sub-page of a namespace: slug relative to the namespace root, page
/// identifier handed to the page layer, and menu label.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub slug: &'static str,
    pub page: &'static str,
    pub label: &'static str,
}

/// NamespaceSpec
///
/// Catalog entry for one role namespace. `allowed` may name alias roles; it is
/// resolved through the registry when the table is built.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceSpec {
    pub owner: Role,
    pub root: &'static str,
    pub title: &'static str,
    pub index_page: &'static str,
    pub allowed: &'static [Role],
    pub pages: &'static [PageSpec],
}

const fn page(slug: &'static str, page: &'static str, label: &'static str) -> PageSpec {
    PageSpec { slug, page, label }
}

/// The role -> route table catalog. Adding a role or a page is a data change here.
pub static NAMESPACES: &[NamespaceSpec] = &[
    NamespaceSpec {
        owner: Role::Admin,
        root: "/admin",
        title: "Administration",
        index_page: "admin.dashboard",
        allowed: &[Role::Admin],
        pages: &[
            page("users", "admin.users", "Users"),
            page("csp-network", "admin.csp_network", "CSP Network"),
            page("fraud-engine", "admin.fraud_engine", "Fraud Engine"),
            page("audits", "admin.audits", "Audits"),
            page("disputes", "admin.disputes", "Disputes"),
            page("rewards", "admin.rewards", "Rewards"),
            page("reports", "admin.reports", "Reports"),
            page("settings", "admin.settings", "Settings"),
        ],
    },
    NamespaceSpec {
        owner: Role::CspAgent,
        root: "/csp",
        title: "CSP Agent",
        index_page: "csp.dashboard",
        allowed: &[Role::CspAgent],
        pages: &[
            page("transactions", "csp.transactions", "Transactions"),
            page("customers", "csp.customers", "Customers"),
            page("accounts/open", "csp.account_opening", "Open Account"),
            page("commissions", "csp.commissions", "Commissions"),
            page("complaints", "csp.complaints", "Complaints"),
            page("training", "csp.training", "Training"),
            page("profile", "csp.profile", "Profile"),
        ],
    },
    NamespaceSpec {
        owner: Role::FieldAuditor,
        root: "/auditor",
        title: "Field Audit",
        index_page: "auditor.dashboard",
        allowed: &[Role::FieldAuditor, Role::Auditor],
        pages: &[
            page("tasks", "auditor.tasks", "Audit Tasks"),
            page("tasks/{task_id}", "auditor.task_detail", "Audit Task"),
            page("checklist", "auditor.checklist", "Checklist"),
            page("reports", "auditor.reports", "Reports"),
            page("history", "auditor.history", "History"),
        ],
    },
    NamespaceSpec {
        owner: Role::ClusterManager,
        root: "/cluster-manager",
        title: "Cluster Management",
        index_page: "cluster_manager.dashboard",
        allowed: &[Role::ClusterManager],
        pages: &[
            page("csp-performance", "cluster_manager.csp_performance", "CSP Performance"),
            page("field-visits", "cluster_manager.field_visits", "Field Visits"),
            page("escalations", "cluster_manager.escalations", "Escalations"),
        ],
    },
    NamespaceSpec {
        owner: Role::OpsTraining,
        root: "/ops-training",
        title: "Operations Training",
        index_page: "ops_training.dashboard",
        allowed: &[Role::OpsTraining],
        pages: &[
            page("courses", "ops_training.courses", "Courses"),
            page("certifications", "ops_training.certifications", "Certifications"),
        ],
    },
    NamespaceSpec {
        owner: Role::Compliance,
        root: "/compliance",
        title: "Compliance",
        index_page: "compliance.dashboard",
        allowed: &[Role::Compliance],
        pages: &[
            page("kyc-review", "compliance.kyc_review", "KYC Review"),
            page("aml-alerts", "compliance.aml_alerts", "AML Alerts"),
            page("audit-trail", "compliance.audit_trail", "Audit Trail"),
        ],
    },
    NamespaceSpec {
        owner: Role::ItInfra,
        root: "/it-infra",
        title: "IT Infrastructure",
        index_page: "it_infra.dashboard",
        allowed: &[Role::ItInfra],
        pages: &[],
    },
    NamespaceSpec {
        owner: Role::Hr,
        root: "/hr",
        title: "Human Resources",
        index_page: "hr.dashboard",
        allowed: &[Role::Hr],
        pages: &[],
    },
    NamespaceSpec {
        owner: Role::CustomerSupport,
        root: "/customer-support",
        title: "Customer Support",
        index_page: "customer_support.dashboard",
        allowed: &[Role::CustomerSupport],
        pages: &[
            page("tickets", "customer_support.tickets", "Tickets"),
            page("disputes", "customer_support.disputes", "Disputes"),
            page("escalations", "customer_support.escalations", "Escalations"),
        ],
    },
    NamespaceSpec {
        owner: Role::BankOfficer,
        root: "/bank-officer",
        title: "Bank Officer",
        index_page: "bank_officer.dashboard",
        allowed: &[Role::BankOfficer],
        pages: &[
            page("approvals", "bank_officer.approvals", "Approvals"),
            page("settlements", "bank_officer.settlements", "Settlements"),
            page("reports", "bank_officer.reports", "Reports"),
        ],
    },
    NamespaceSpec {
        owner: Role::FiAgent,
        root: "/fi-agent",
        title: "FI Agent",
        index_page: "fi_agent.dashboard",
        allowed: &[Role::FiAgent],
        pages: &[
            page("enrollments", "fi_agent.enrollments", "Enrollments"),
            page("collections", "fi_agent.collections", "Collections"),
        ],
    },
    NamespaceSpec {
        owner: Role::Customer,
        root: "/customer",
        title: "My Banking",
        index_page: "customer.dashboard",
        allowed: &[Role::Customer],
        pages: &[
            page("accounts", "customer.accounts", "Accounts"),
            page("transactions", "customer.transactions", "Transactions"),
            page("rewards", "customer.rewards", "Rewards"),
            // Same page instances as the public routes of the same name.
            page("file-complaint", "customer.complaint_form", "File a Complaint"),
            page("track-complaint", "customer.complaint_tracker", "Track Complaint"),
            page("verify-csp", "customer.csp_verification", "Verify a CSP"),
        ],
    },
];

/// Catalog lookup by canonical owner.
pub fn namespace_spec(owner: Role) -> Option<&'static NamespaceSpec> {
    NAMESPACES.iter().find(|spec| spec.owner == owner)
}

/// Namespace root for a canonical role. Roles without a catalog entry get
/// `/<role>` with underscores turned into dashes.
pub fn namespace_root(owner: Role) -> String {
    match namespace_spec(owner) {
        Some(spec) => spec.root.to_string(),
        None => format!("/{}", owner.as_str().replace('_', "-")),
    }
}

/// RouteTableBuilder
///
/// Pure role -> ordered bindings function. Holds only the registry, so the
/// same input always yields the same table and results can be memoized or
/// precomputed at startup without coordination.
#[derive(Debug, Clone)]
pub struct RouteTableBuilder {
    registry: RoleRegistry,
}

impl RouteTableBuilder {
    pub fn new(registry: RoleRegistry) -> Self {
        Self { registry }
    }

    /// The namespace-wide required-role-set for `owner`, alias-resolved.
    pub fn required_roles(&self, owner: Role) -> BTreeSet<Role> {
        let owner = self.registry.canonical(owner);
        match namespace_spec(owner) {
            Some(spec) => {
                let mut roles = self.registry.canonical_set(spec.allowed);
                roles.insert(owner);
                roles
            }
            None => BTreeSet::from([owner]),
        }
    }

    /// build_route_table
    ///
    /// Produces the bindings of one namespace, index route first.
    ///
    /// * `Unknown` roles get an empty table.
    /// * Every canonical role gets at least the index binding at `base_path`,
    ///   even when the catalog lists no sub-pages for it.
    /// * A non-canonical role is resolved first and receives its canonical
    ///   role's table.
    pub fn build_route_table(&self, role: ResolvedRole, base_path: &str) -> Vec<RouteBinding> {
        let Some(role) = role.role() else {
            debug!("unknown role receives an empty route table");
            return Vec::new();
        };

        let owner = self.registry.canonical(role);
        if owner != role {
            debug!(%role, %owner, "building route table through alias");
        }

        let required_roles = self.required_roles(owner);
        let binding = |slug: &str, page: &str, label: &str| RouteBinding {
            path: join(base_path, slug),
            page: page.to_string(),
            label: label.to_string(),
            required_roles: required_roles.clone(),
        };

        match namespace_spec(owner) {
            Some(spec) => std::iter::once(binding("", spec.index_page, spec.title))
                .chain(
                    spec.pages
                        .iter()
                        .map(|p| binding(p.slug, p.page, p.label)),
                )
                .collect(),
            None => {
                let page = format!("{}.home", owner.as_str());
                vec![binding("", &page, owner.as_str())]
            }
        }
    }
}
