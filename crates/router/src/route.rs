//! Static route table

/// Path of the login screen, the only route reachable without a session
pub const LOGIN_PATH: &str = "/login";

const MAX_STATIC_REDIRECTS: usize = 8;

/// Views a route can render
///
/// The view itself is loaded by the host application on first render; the
/// route table only carries this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Dashboard,
    Materials,
    MixRecipes,
    Tasks,
}

impl View {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Materials => "Materials",
            Self::MixRecipes => "MixRecipes",
            Self::Tasks => "Tasks",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a matched path leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    View(View),
    Redirect(&'static str),
}

/// One row of the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub target: RouteTarget,
}

/// The application's routes
pub static ROUTES: &[RouteEntry] = &[
    RouteEntry {
        path: LOGIN_PATH,
        target: RouteTarget::View(View::Login),
    },
    RouteEntry {
        path: "/dashboard",
        target: RouteTarget::View(View::Dashboard),
    },
    RouteEntry {
        path: "/materials",
        target: RouteTarget::View(View::Materials),
    },
    RouteEntry {
        path: "/mix/recipes",
        target: RouteTarget::View(View::MixRecipes),
    },
    RouteEntry {
        path: "/tasks",
        target: RouteTarget::View(View::Tasks),
    },
    RouteEntry {
        path: "/",
        target: RouteTarget::Redirect("/dashboard"),
    },
];

/// Immutable lookup over a set of route entries
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    entries: &'static [RouteEntry],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(ROUTES)
    }
}

impl RouteTable {
    pub const fn new(entries: &'static [RouteEntry]) -> Self {
        Self { entries }
    }

    pub const fn entries(&self) -> &'static [RouteEntry] {
        self.entries
    }

    /// Entry whose path equals the normalized `path`
    pub fn find(&self, path: &str) -> Option<&'static RouteEntry> {
        let path = normalize(path);
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Apply static redirects until a non-redirect path is reached
    ///
    /// Cycles are cut after a fixed number of hops.
    pub fn follow_redirects(&self, path: &str) -> String {
        let mut current = normalize(path);
        for _ in 0..MAX_STATIC_REDIRECTS {
            match self.find(&current) {
                Some(RouteEntry {
                    target: RouteTarget::Redirect(to),
                    ..
                }) => current = normalize(to),
                _ => break,
            }
        }
        current
    }

    /// View rendered at `path`, if it names one
    pub fn view(&self, path: &str) -> Option<View> {
        match self.find(path)?.target {
            RouteTarget::View(view) => Some(view),
            RouteTarget::Redirect(_) => None,
        }
    }
}

/// Canonical form of a navigation target: query and fragment dropped,
/// exactly one leading slash, no trailing slash except for the root
pub fn normalize(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("tasks"), "/tasks");
        assert_eq!(normalize("/tasks/"), "/tasks");
        assert_eq!(normalize("/mix/recipes?page=2"), "/mix/recipes");
        assert_eq!(normalize("/materials#top"), "/materials");
        assert_eq!(normalize("//login"), "/login");
    }

    #[test]
    fn test_table_lists_every_route() {
        let table = RouteTable::default();
        let paths: Vec<_> = table.entries().iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec!["/login", "/dashboard", "/materials", "/mix/recipes", "/tasks", "/"]
        );
    }

    #[test]
    fn test_views_resolve() {
        let table = RouteTable::default();
        assert_eq!(table.view("/login"), Some(View::Login));
        assert_eq!(table.view("/mix/recipes/"), Some(View::MixRecipes));
        assert_eq!(table.view("/tasks?status=RUNNING"), Some(View::Tasks));
        assert_eq!(table.view("/"), None);
        assert_eq!(table.view("/unknown"), None);
    }

    #[test]
    fn test_root_redirects_to_dashboard() {
        let table = RouteTable::default();
        assert_eq!(table.follow_redirects("/"), "/dashboard");
        assert_eq!(table.follow_redirects(""), "/dashboard");
        assert_eq!(table.follow_redirects("/materials"), "/materials");
        assert_eq!(table.follow_redirects("/unknown"), "/unknown");
    }

    #[test]
    fn test_redirect_cycle_terminates() {
        static CYCLE: &[RouteEntry] = &[
            RouteEntry {
                path: "/a",
                target: RouteTarget::Redirect("/b"),
            },
            RouteEntry {
                path: "/b",
                target: RouteTarget::Redirect("/a"),
            },
        ];
        let table = RouteTable::new(CYCLE);
        let end = table.follow_redirects("/a");
        assert!(end == "/a" || end == "/b");
    }
}
