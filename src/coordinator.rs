use crate::datasource::{DataSource, FetchRequest};
use crate::errors::{DataError, ExportError};
use crate::export::{self, CsvExport, ImageExport};
use crate::layout::{correlation_matrix, ChartTarget, DataRef, ViewKind};
use crate::models::{ChartKind, Endpoint, RecordCollection, Series};
use crate::notices::{Notice, NoticeBoard, NoticeLevel};
use crate::render::{Placeholder, Renderer};
use crate::selection::{Selection, SelectionChange};
use crate::series::derive_series;
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

pub type SharedView = Arc<Mutex<DashboardView>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChartState {
    Loading,
    Error { message: String },
    NoData,
    Rendered { series: Vec<Series> },
}

/// A container and what it currently displays.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBinding {
    pub container: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub csv_endpoint: Option<Endpoint>,
    #[serde(flatten)]
    pub state: ChartState,
    #[serde(skip)]
    target: ChartTarget,
}

impl ChartBinding {
    fn new(target: ChartTarget) -> Self {
        Self {
            container: target.container,
            title: target.title,
            kind: target.projection.kind,
            csv_endpoint: target.csv_endpoint(),
            state: ChartState::Loading,
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The selection moved on while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub view: ViewKind,
    pub selection: Selection,
    pub charts: Vec<ChartBinding>,
    pub notices: Vec<Notice>,
}

/// One page's charts, their shared selection and the datasets feeding them.
pub struct DashboardView {
    kind: ViewKind,
    selection: Selection,
    bindings: Vec<ChartBinding>,
    collections: HashMap<FetchRequest, RecordCollection>,
    failures: HashMap<FetchRequest, DataError>,
    in_flight: HashSet<FetchRequest>,
    correlations: RecordCollection,
    renderer: Box<dyn Renderer>,
    notices: NoticeBoard,
}

impl DashboardView {
    pub fn new(kind: ViewKind, selection: Selection, renderer: Box<dyn Renderer>) -> Self {
        Self {
            kind,
            selection,
            bindings: kind.targets().into_iter().map(ChartBinding::new).collect(),
            collections: HashMap::new(),
            failures: HashMap::new(),
            in_flight: HashSet::new(),
            correlations: correlation_matrix(),
            renderer,
            notices: NoticeBoard::default(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn bindings(&self) -> &[ChartBinding] {
        &self.bindings
    }

    pub fn binding(&self, container: &str) -> Option<&ChartBinding> {
        self.bindings.iter().find(|binding| binding.container == container)
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Puts every container into its loading state and returns the fetches
    /// the view needs. Charts with built-in data render straight away.
    ///
    /// Mounting the view again re-issues only what failed or was never
    /// fetched; cached datasets render immediately.
    pub fn initialize(&mut self) -> Vec<FetchRequest> {
        self.failures.clear();
        for binding in &mut self.bindings {
            binding.state = ChartState::Loading;
            self.renderer.show_placeholder(binding.container, Placeholder::Loading);
        }
        let requests = self.issue_requests();
        self.refresh_all();
        requests
    }

    /// Mutates the selection, re-derives every chart and returns any fetches
    /// the new selection needs.
    pub fn update_selection(&mut self, change: SelectionChange) -> Vec<FetchRequest> {
        if !self.selection.apply(change) {
            return Vec::new();
        }
        let requests = self.issue_requests();
        self.refresh_all();
        requests
    }

    pub fn apply_fetch(
        &mut self,
        request: FetchRequest,
        result: Result<RecordCollection, DataError>,
    ) -> FetchOutcome {
        self.in_flight.remove(&request);

        if let Some(city) = &request.city {
            if self.selection.city() != Some(city.as_str()) {
                debug!("discarding stale response for {request}");
                return FetchOutcome::Discarded;
            }
        }

        let mut selection_changed = false;
        match result {
            Ok(collection) => {
                if let Some(bounds) = collection.year_bounds() {
                    selection_changed = self.selection.observe_year_domain(bounds);
                }
                self.failures.remove(&request);
                self.collections.insert(request.clone(), collection);
            }
            Err(err) => {
                warn!("{err}");
                self.failures.insert(request.clone(), err);
            }
        }

        if selection_changed {
            self.refresh_all();
        } else {
            for index in 0..self.bindings.len() {
                if self.request_for(&self.bindings[index].target).as_ref() == Some(&request) {
                    self.refresh(index);
                }
            }
        }
        FetchOutcome::Applied
    }

    /// Draws `series` into `container`; an empty list clears it and shows
    /// the no-data placeholder.
    pub fn render(&mut self, kind: ChartKind, container: &str, series: Vec<Series>) {
        let state = if series.is_empty() {
            self.renderer.clear(container);
            self.renderer.show_placeholder(container, Placeholder::NoData);
            ChartState::NoData
        } else {
            self.renderer.draw(container, kind, &series);
            ChartState::Rendered { series }
        };
        if let Some(binding) = self.bindings.iter_mut().find(|binding| binding.container == container) {
            binding.state = state;
        }
    }

    pub fn snapshot(&mut self) -> ViewSnapshot {
        ViewSnapshot {
            view: self.kind,
            selection: self.selection.clone(),
            charts: self.bindings.clone(),
            notices: self.notices.active(Utc::now()),
        }
    }

    /// Cached full dataset for an endpoint, if this view has fetched it.
    pub fn cached(&self, endpoint: Endpoint) -> Option<RecordCollection> {
        self.collections.get(&FetchRequest::new(endpoint)).cloned()
    }

    pub fn export_image(&mut self, container: &str, name: Option<&str>) -> Result<ImageExport, ExportError> {
        let result = match self.binding(container) {
            None => Err(ExportError::UnknownContainer(container.to_string())),
            Some(binding) => {
                let name = name.unwrap_or(binding.title).to_string();
                export::chart_image(self.renderer.as_ref(), container, &name)
            }
        };
        if let Err(err) = &result {
            warn!("chart export failed: {err}");
            self.notices.push(NoticeLevel::Error, format!("Error downloading chart: {err}"));
        }
        result
    }

    fn request_for(&self, target: &ChartTarget) -> Option<FetchRequest> {
        match target.data {
            DataRef::Fetched(endpoint) => Some(FetchRequest::new(endpoint)),
            DataRef::CityScoped(endpoint) => self
                .selection
                .city()
                .map(|city| FetchRequest::for_city(endpoint, city)),
            DataRef::Correlations => None,
        }
    }

    fn issue_requests(&mut self) -> Vec<FetchRequest> {
        let mut requests = Vec::new();
        for binding in &self.bindings {
            let Some(request) = self.request_for(&binding.target) else {
                continue;
            };
            // Failures stay put until the view is mounted again.
            if self.collections.contains_key(&request)
                || self.failures.contains_key(&request)
                || self.in_flight.contains(&request)
                || requests.contains(&request)
            {
                continue;
            }
            requests.push(request);
        }
        for request in &requests {
            self.in_flight.insert(request.clone());
        }
        requests
    }

    fn derive_state(&self, target: &ChartTarget) -> Result<Vec<Series>, ChartState> {
        let collection = match target.data {
            DataRef::Correlations => &self.correlations,
            _ => {
                let Some(request) = self.request_for(target) else {
                    return Ok(Vec::new());
                };
                match (self.collections.get(&request), self.failures.get(&request)) {
                    (Some(collection), _) => collection,
                    (None, Some(err)) => {
                        return Err(ChartState::Error { message: err.to_string() });
                    }
                    (None, None) => return Err(ChartState::Loading),
                }
            }
        };
        Ok(derive_series(collection, &self.selection, &target.projection))
    }

    fn refresh(&mut self, index: usize) {
        let target = self.bindings[index].target.clone();
        match self.derive_state(&target) {
            Ok(series) => self.render(target.projection.kind, target.container, series),
            Err(state) => {
                let placeholder = match &state {
                    ChartState::Error { message } => Placeholder::Error { message: message.clone() },
                    _ => Placeholder::Loading,
                };
                self.renderer.show_placeholder(target.container, placeholder);
                self.bindings[index].state = state;
            }
        }
    }

    fn refresh_all(&mut self) {
        for index in 0..self.bindings.len() {
            self.refresh(index);
        }
    }
}

/// Runs each request on its own task; each applies its result on arrival.
pub fn dispatch<S: DataSource>(
    view: &SharedView,
    source: &Arc<S>,
    requests: Vec<FetchRequest>,
) -> Vec<JoinHandle<FetchOutcome>> {
    requests
        .into_iter()
        .map(|request| {
            let view = Arc::clone(view);
            let source = Arc::clone(source);
            tokio::spawn(async move {
                let result = source.fetch(&request).await;
                view.lock().await.apply_fetch(request, result)
            })
        })
        .collect()
}

pub async fn initialize<S: DataSource>(view: &SharedView, source: &Arc<S>) -> Vec<JoinHandle<FetchOutcome>> {
    let (kind, requests) = {
        let mut guard = view.lock().await;
        (guard.kind(), guard.initialize())
    };
    info!("initializing {kind} view with {} fetches", requests.len());
    dispatch(view, source, requests)
}

pub async fn change_selection<S: DataSource>(
    view: &SharedView,
    source: &Arc<S>,
    change: SelectionChange,
) -> (ViewSnapshot, Vec<JoinHandle<FetchOutcome>>) {
    let (snapshot, requests) = {
        let mut guard = view.lock().await;
        let requests = guard.update_selection(change);
        (guard.snapshot(), requests)
    };
    (snapshot, dispatch(view, source, requests))
}

/// CSV of the full dataset behind an endpoint, independent of the selection.
pub async fn export_csv<S: DataSource>(
    view: &SharedView,
    source: &S,
    endpoint: Endpoint,
    name: &str,
) -> Result<CsvExport, ExportError> {
    let cached = view.lock().await.cached(endpoint);
    let collection = match cached {
        Some(collection) => Ok(collection),
        None => source.fetch(&FetchRequest::new(endpoint)).await,
    };

    let result = collection
        .map_err(ExportError::from)
        .and_then(|collection| export::csv_export(&collection, name));

    let mut guard = view.lock().await;
    match &result {
        Ok(export) => {
            info!("exported {} as {}", endpoint, export.file_name);
            guard.notices_mut().push(NoticeLevel::Success, "CSV downloaded successfully!");
        }
        Err(ExportError::Empty) => {
            guard.notices_mut().push(NoticeLevel::Warning, "No data available to download");
        }
        Err(err) => {
            warn!("csv export of {endpoint} failed: {err}");
            guard.notices_mut().push(NoticeLevel::Error, "Error downloading CSV data");
        }
    }
    result
}
