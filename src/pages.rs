use std::collections::BTreeMap;
use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;

use crate::{error::PageError, models::Session};

/// RenderRequest
///
/// Everything the page layer receives for one render: the page identifier
/// from the matched binding, the concrete path, captured params, and the
/// session (opaque to the routing core).
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub page: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub session: Session,
}

/// PageRenderer
///
/// Contract for the page layer. The routing core hands over a page
/// identifier and never inspects what the renderer does with it, which lets
/// the production UI bundle and test doubles be swapped freely.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Produces the HTML document for `request`.
    async fn render(&self, request: RenderRequest) -> Result<String, PageError>;
}

/// PageState
///
/// The shared handle to the page layer stored in `AppState`.
pub type PageState = Arc<dyn PageRenderer>;

/// ShellPageRenderer
///
/// Default renderer: an HTML shell that mounts the client bundle on
/// `#portal` with the page identifier and params as data attributes.
#[derive(Clone, Debug)]
pub struct ShellPageRenderer {
    pub title: String,
    pub bundle_path: String,
}

impl Default for ShellPageRenderer {
    fn default() -> Self {
        Self {
            title: "CSP Portal".to_string(),
            bundle_path: "/assets/portal.js".to_string(),
        }
    }
}

/// PortalTemplate
///
/// The page shell. Askama escapes every field for HTML attributes.
#[derive(Template)]
#[template(path = "portal.html")]
struct PortalTemplate<'a> {
    title: &'a str,
    page: &'a str,
    path: &'a str,
    params: String,
    bundle: &'a str,
}

#[async_trait]
impl PageRenderer for ShellPageRenderer {
    async fn render(&self, request: RenderRequest) -> Result<String, PageError> {
        let params = serde_json::to_string(&request.params)?;
        let shell = PortalTemplate {
            title: &self.title,
            page: &request.page,
            path: &request.path,
            params,
            bundle: &self.bundle_path,
        };
        Ok(shell.render()?)
    }
}
