//! Navigation Assembly
//!
//! Composes the Route Table Builder and the Route Guard into the single
//! routing tree consulted whenever a URL is resolved: one public subtree,
//! one guarded subtree per role namespace, and a not-found fallback that is
//! always evaluated last.
pub mod path;
pub mod public;
pub mod table;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    error::{AccessError, ConfigError},
    guard::{GuardState, Observation, RouteGuard},
    models::{
        MenuItem, NamespaceTable, NavigationView, Outcome, Resolution, RouteBinding, Session,
    },
    roles::{ResolvedRole, Role, RoleRegistry},
};
use path::{PathPattern, is_within, normalize_path};
use public::{LOGIN_PATH, NOT_FOUND_PAGE, UNAUTHORIZED_PATH, public_routes};
use table::{RouteTableBuilder, namespace_root, namespace_spec};

#[derive(Debug, Clone)]
struct CompiledRoute {
    binding: RouteBinding,
    pattern: PathPattern,
}

impl CompiledRoute {
    fn compile(binding: RouteBinding) -> Result<Self, ConfigError> {
        let pattern = PathPattern::parse(&binding.path)?;
        Ok(Self { binding, pattern })
    }
}

#[derive(Debug, Clone)]
struct Namespace {
    table: NamespaceTable,
    // Synthetic binding used to guard the namespace root itself.
    gate: RouteBinding,
    routes: Vec<CompiledRoute>,
}

/// RouteMatch
///
/// A binding matched by a concrete path, with captured `{param}` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub binding: &'a RouteBinding,
    pub params: BTreeMap<String, String>,
}

/// NavigationTree
///
/// Immutable once assembled. Safe to share behind an `Arc` and to resolve
/// from any number of requests concurrently.
#[derive(Debug, Clone)]
pub struct NavigationTree {
    guard: RouteGuard,
    public: Vec<CompiledRoute>,
    namespaces: Vec<Namespace>,
}

impl NavigationTree {
    /// assemble
    ///
    /// Builds the tree for the given roles. Aliases collapse onto their
    /// canonical role, so `auditor` and `field_auditor` yield one namespace.
    pub fn assemble(registry: RoleRegistry, roles: &[Role]) -> Result<Self, ConfigError> {
        let builder = RouteTableBuilder::new(registry.clone());
        let mut seen = BTreeSet::new();
        let mut tables = Vec::new();

        for &role in roles {
            let owner = registry.canonical(role);
            if !seen.insert(owner) {
                debug!(%role, %owner, "namespace already assembled");
                continue;
            }

            let root = namespace_root(owner);
            let title = namespace_spec(owner)
                .map(|spec| spec.title.to_string())
                .unwrap_or_else(|| owner.to_string());
            tables.push(NamespaceTable {
                owner,
                bindings: builder.build_route_table(ResolvedRole::Known(owner), &root),
                required_roles: builder.required_roles(owner),
                root,
                title,
            });
        }

        Self::from_parts(registry, public_routes(), tables)
    }

    /// Every canonical role known to the registry.
    pub fn for_all_roles(registry: RoleRegistry) -> Result<Self, ConfigError> {
        let roles = registry.canonical_roles();
        Self::assemble(registry, &roles)
    }

    /// from_parts
    ///
    /// Validates and compiles a public subtree plus namespace tables.
    ///
    /// # Errors
    /// * `InvalidPath` for unparsable or parameterized roots and bindings.
    /// * `DuplicateNamespace` / `OverlappingNamespace` when roots collide.
    /// * `ReservedPath` when a root is `/`, a public path falls inside a
    ///   namespace, a binding escapes its namespace, or `/login` /
    ///   `/unauthorized` is not public.
    pub fn from_parts(
        registry: RoleRegistry,
        public: Vec<RouteBinding>,
        tables: Vec<NamespaceTable>,
    ) -> Result<Self, ConfigError> {
        for (i, table) in tables.iter().enumerate() {
            let root = PathPattern::parse(&table.root)?;
            if root.has_params() || normalize_path(&table.root) != table.root {
                return Err(ConfigError::InvalidPath {
                    path: table.root.clone(),
                });
            }
            if table.root == "/" {
                return Err(ConfigError::ReservedPath {
                    path: table.root.clone(),
                });
            }

            for other in &tables[..i] {
                if other.root == table.root {
                    return Err(ConfigError::DuplicateNamespace {
                        root: table.root.clone(),
                    });
                }
                if is_within(&other.root, &table.root) {
                    return Err(ConfigError::OverlappingNamespace {
                        outer: other.root.clone(),
                        inner: table.root.clone(),
                    });
                }
                if is_within(&table.root, &other.root) {
                    return Err(ConfigError::OverlappingNamespace {
                        outer: table.root.clone(),
                        inner: other.root.clone(),
                    });
                }
            }

            if let Some(stray) = table
                .bindings
                .iter()
                .find(|b| !is_within(&table.root, &normalize_path(&b.path)))
            {
                return Err(ConfigError::ReservedPath {
                    path: stray.path.clone(),
                });
            }
        }

        for binding in &public {
            if let Some(table) = tables
                .iter()
                .find(|t| is_within(&t.root, &normalize_path(&binding.path)))
            {
                debug!(path = %binding.path, root = %table.root, "public path inside namespace");
                return Err(ConfigError::ReservedPath {
                    path: binding.path.clone(),
                });
            }
        }
        for reserved in [LOGIN_PATH, UNAUTHORIZED_PATH] {
            if !public.iter().any(|b| b.path == reserved && b.is_public()) {
                return Err(ConfigError::ReservedPath {
                    path: reserved.to_string(),
                });
            }
        }

        let public = public
            .into_iter()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let namespaces = tables
            .into_iter()
            .map(|table| {
                let routes = table
                    .bindings
                    .iter()
                    .cloned()
                    .map(CompiledRoute::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = RouteBinding {
                    path: table.root.clone(),
                    page: String::new(),
                    label: table.title.clone(),
                    required_roles: table.required_roles.clone(),
                };
                Ok(Namespace {
                    table,
                    gate,
                    routes,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        info!(
            public = public.len(),
            namespaces = namespaces.len(),
            "navigation tree assembled"
        );

        Ok(Self {
            guard: RouteGuard::new(registry),
            public,
            namespaces,
        })
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn not_found_page(&self) -> &str {
        NOT_FOUND_PAGE
    }

    /// Finds the binding serving `path`, ignoring authorization.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(path);
        let routes = match self.namespace_containing(&path) {
            Some(namespace) => &namespace.routes,
            None => &self.public,
        };
        routes.iter().find_map(|route| {
            route.pattern.matches(&path).map(|params| RouteMatch {
                binding: &route.binding,
                params,
            })
        })
    }

    /// resolve
    ///
    /// Resolves a concrete URL for `session`, evaluated now.
    pub fn resolve(&self, path: &str, session: &Session) -> Resolution {
        self.resolve_at(path, session, Utc::now())
    }

    pub fn resolve_at(&self, path: &str, session: &Session, now: DateTime<Utc>) -> Resolution {
        let observation = self.guard.observe(session, now);
        self.resolve_observed(path, &observation)
    }

    /// resolve_observed
    ///
    /// Namespace requests pass the namespace gate first, so an unentitled
    /// requester is redirected even for sub-paths that do not exist. Paths
    /// matching nothing, including inside a namespace the requester may enter,
    /// resolve to `NotFound`.
    pub fn resolve_observed(&self, path: &str, observation: &Observation) -> Resolution {
        let path = normalize_path(path);

        if let Some(namespace) = self.namespace_containing(&path) {
            let decision = self.guard.decide(&namespace.gate, &path, observation);
            if !decision.is_render() {
                return Self::redirect_resolution(decision.outcome, decision.target, decision.reason);
            }
        }

        let Some(RouteMatch { binding, params }) = self.match_path(&path) else {
            debug!(%path, reason = %AccessError::NoMatchingRoute(path.clone()), "not found");
            return Resolution::NotFound {
                path,
                page: NOT_FOUND_PAGE.to_string(),
            };
        };

        let decision = self.guard.decide(binding, &path, observation);
        match decision.outcome {
            Outcome::Render => Resolution::Render {
                page: binding.page.clone(),
                path,
                params,
            },
            outcome => Self::redirect_resolution(outcome, decision.target, decision.reason),
        }
    }

    fn redirect_resolution(
        outcome: Outcome,
        target: Option<String>,
        reason: Option<AccessError>,
    ) -> Resolution {
        match outcome {
            Outcome::RedirectToLogin => Resolution::RedirectToLogin {
                target: target.unwrap_or_else(|| LOGIN_PATH.to_string()),
                reason,
            },
            _ => Resolution::RedirectToUnauthorized {
                target: target.unwrap_or_else(|| UNAUTHORIZED_PATH.to_string()),
                reason,
            },
        }
    }

    fn namespace_containing(&self, path: &str) -> Option<&Namespace> {
        self.namespaces
            .iter()
            .find(|namespace| is_within(&namespace.table.root, path))
    }

    fn entitled_namespaces(&self, session: &Session) -> impl Iterator<Item = &Namespace> {
        let observation = self.guard.observe(session, Utc::now());
        self.namespaces.iter().filter(move |namespace| {
            matches!(observation.state, GuardState::Authenticated(_))
                && self
                    .guard
                    .decide(&namespace.gate, &namespace.table.root, &observation)
                    .is_render()
        })
    }

    pub fn public_routes(&self) -> Vec<RouteBinding> {
        self.public.iter().map(|r| r.binding.clone()).collect()
    }

    pub fn namespace_tables(&self) -> Vec<NamespaceTable> {
        self.namespaces.iter().map(|n| n.table.clone()).collect()
    }

    /// The public subtree plus only the namespaces `session` may enter.
    pub fn visible_to(&self, session: &Session) -> NavigationView {
        NavigationView {
            public: self.public_routes(),
            namespaces: self
                .entitled_namespaces(session)
                .map(|n| n.table.clone())
                .collect(),
            not_found_page: NOT_FOUND_PAGE.to_string(),
        }
    }

    /// Menu entries of the session's namespaces; parameterized routes are skipped.
    pub fn menu_for(&self, session: &Session) -> Vec<MenuItem> {
        self.entitled_namespaces(session)
            .flat_map(|namespace| namespace.routes.iter())
            .filter(|route| !route.pattern.has_params())
            .map(|route| MenuItem {
                label: route.binding.label.clone(),
                path: route.binding.path.clone(),
            })
            .collect()
    }

    /// Namespace root owned by `role` (after alias resolution), if assembled.
    pub fn home_path_for(&self, role: Role) -> Option<&str> {
        let owner = self.guard.registry().canonical(role);
        self.namespaces
            .iter()
            .find(|namespace| namespace.table.owner == owner)
            .map(|namespace| namespace.table.root.as_str())
    }

    /// Landing path for a session: its namespace root, if it has one.
    pub fn home_for(&self, session: &Session) -> Option<String> {
        match self.guard.observe(session, Utc::now()).state {
            GuardState::Authenticated(ResolvedRole::Known(role)) => {
                self.home_path_for(role).map(str::to_string)
            }
            _ => None,
        }
    }

    /// post_login_target
    ///
    /// Where to resume after a successful login: `next` when it is a local
    /// path the session may render, otherwise the session's home, otherwise `/`.
    /// Absolute and protocol-relative URLs are never followed.
    pub fn post_login_target(&self, next: Option<&str>, session: &Session) -> String {
        let resumable = next
            .filter(|next| is_local_path(next))
            .map(normalize_path)
            .filter(|next| next != LOGIN_PATH)
            .filter(|next| matches!(self.resolve(next, session), Resolution::Render { .. }));

        resumable
            .or_else(|| self.home_for(session))
            .unwrap_or_else(|| "/".to_string())
    }
}

fn is_local_path(candidate: &str) -> bool {
    candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.contains('\\')
}
