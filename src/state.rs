use crate::assistant::Assistant;
use crate::config::Config;
use crate::coordinator::{DashboardView, SharedView};
use crate::datasource::HttpDataSource;
use crate::layout::ViewKind;
use crate::render::Canvas;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<HttpDataSource>,
    pub main: SharedView,
    pub comparison: SharedView,
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let view = |kind: ViewKind| {
            let selection = kind.default_selection(&config.default_city);
            Arc::new(Mutex::new(DashboardView::new(kind, selection, Box::new(Canvas::new()))))
        };

        Self {
            source: Arc::new(HttpDataSource::new(config.api_base.clone())),
            main: view(ViewKind::Main),
            comparison: view(ViewKind::Comparison),
            assistant: Arc::new(Assistant::new(config.chat_url.clone(), config.assistant_delay)),
        }
    }

    pub fn view(&self, kind: ViewKind) -> &SharedView {
        match kind {
            ViewKind::Main => &self.main,
            ViewKind::Comparison => &self.comparison,
        }
    }
}
