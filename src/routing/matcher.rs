//! Route table and first-match dispatch.

use hyper::Method;

use super::pattern::{RouteMatch, RoutePattern};

/// Operation served by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    List,
    Create,
    Update,
    Delete,
    Complete,
    Populate,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: RoutePattern,
    pub action: TaskAction,
}

/// Routes in registration order
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `template` for `method`
    #[must_use]
    pub fn route(mut self, method: Method, template: &str, action: TaskAction) -> Self {
        self.routes.push(Route {
            method,
            pattern: RoutePattern::compile(template),
            action,
        });
        self
    }

    /// The task API
    pub fn tasks() -> Self {
        Self::new()
            .route(Method::GET, "/tasks", TaskAction::List)
            .route(Method::POST, "/tasks", TaskAction::Create)
            .route(Method::PUT, "/tasks/:id", TaskAction::Update)
            .route(Method::DELETE, "/tasks/:id", TaskAction::Delete)
            .route(Method::PATCH, "/tasks/:id/complete", TaskAction::Complete)
            .route(Method::POST, "/tasks/populate", TaskAction::Populate)
    }

    /// Find the first route whose method and pattern both match
    pub fn dispatch(&self, method: &Method, target: &str) -> Option<(&Route, RouteMatch)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.match_target(target).map(|m| (route, m)))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(router: &Router, method: Method, target: &str) -> Option<TaskAction> {
        router.dispatch(&method, target).map(|(route, _)| route.action)
    }

    #[test]
    fn test_task_routes() {
        let router = Router::tasks();
        assert_eq!(router.routes().len(), 6);

        assert_eq!(action(&router, Method::GET, "/tasks"), Some(TaskAction::List));
        assert_eq!(action(&router, Method::GET, "/tasks?search=a"), Some(TaskAction::List));
        assert_eq!(action(&router, Method::POST, "/tasks"), Some(TaskAction::Create));
        assert_eq!(action(&router, Method::PUT, "/tasks/abc"), Some(TaskAction::Update));
        assert_eq!(action(&router, Method::DELETE, "/tasks/abc"), Some(TaskAction::Delete));
        assert_eq!(
            action(&router, Method::PATCH, "/tasks/abc/complete"),
            Some(TaskAction::Complete)
        );
        assert_eq!(
            action(&router, Method::POST, "/tasks/populate"),
            Some(TaskAction::Populate)
        );
    }

    #[test]
    fn test_method_and_path_must_both_match() {
        let router = Router::tasks();
        assert_eq!(action(&router, Method::PATCH, "/tasks"), None);
        assert_eq!(action(&router, Method::GET, "/tasks/abc"), None);
        assert_eq!(action(&router, Method::GET, "/projects"), None);
        assert_eq!(action(&router, Method::PATCH, "/tasks/abc"), None);
    }

    #[test]
    fn test_first_registered_route_wins() {
        let router = Router::new()
            .route(Method::PUT, "/tasks/:id", TaskAction::Update)
            .route(Method::PUT, "/tasks/populate", TaskAction::Populate);
        assert_eq!(
            action(&router, Method::PUT, "/tasks/populate"),
            Some(TaskAction::Update)
        );
    }

    #[test]
    fn test_dispatch_returns_params() {
        let router = Router::tasks();
        let (route, matched) = router.dispatch(&Method::DELETE, "/tasks/42?force=1").unwrap();
        assert_eq!(route.pattern.template(), "/tasks/:id");
        assert_eq!(matched.params["id"], "42");
        assert_eq!(matched.query.as_deref(), Some("?force=1"));
    }
}
