//! Per-user dashboard state and the recomputation of its derived views.

use std::{str::FromStr, sync::Arc};

use log::debug;

use crate::{
    client::degrade, histogram, project, BarChart, Category, Error, Histogram, MapView,
    MarkerFields, MarkerView, Record, RecordStore, Shelter, Table,
};

/// Receives the dashboard's derived views whenever they change.
///
/// Every method has an empty default, so a renderer only needs to implement
/// the views it displays.
pub trait Render {
    fn table(&mut self, _rows: &[Record]) {}
    fn chart(&mut self, _chart: &BarChart) {}
    fn map(&mut self, _map: &MapView) {}
}

/// The dashboard state of a single user.
///
/// The visible rows are an immutable snapshot that is replaced as a whole
/// whenever the filter changes; the histogram and marker are recomputed from
/// the current snapshot after every change.
pub struct Session<'a, S> {
    shelter: &'a Shelter<S>,
    fields: MarkerFields,
    category: Category,
    rows: Arc<[Record]>,
    selection: Option<usize>,
    histogram: Histogram,
    marker: Option<MarkerView>,
    renderers: Vec<Box<dyn Render + 'a>>,
}

impl<'a, S: RecordStore> Session<'a, S> {
    /// Start a session showing every record.
    pub fn open(shelter: &'a Shelter<S>, fields: MarkerFields) -> Self {
        Self::start(shelter, fields, Category::All)
    }

    /// Start a session already filtered to the selected category, querying
    /// the store once. Unknown categories are rejected without a query.
    pub fn open_with_category(
        shelter: &'a Shelter<S>,
        fields: MarkerFields,
        selected: &str,
    ) -> Result<Self, Error> {
        let category = Category::from_str(selected)?;
        Ok(Self::start(shelter, fields, category))
    }

    fn start(shelter: &'a Shelter<S>, fields: MarkerFields, category: Category) -> Self {
        let mut session = Self {
            shelter,
            fields,
            category,
            rows: Arc::from(Vec::new()),
            selection: None,
            histogram: Histogram::default(),
            marker: None,
            renderers: Vec::new(),
        };
        session.load(category);
        session
    }

    /// Register a renderer. It immediately receives the current views.
    pub fn subscribe<R: Render + 'a>(&mut self, mut renderer: R) {
        self.render_to(&mut renderer, true);
        self.renderers.push(Box::new(renderer));
    }

    /// Handle a change of the filter control.
    ///
    /// Values outside the known categories are rejected before the store is
    /// queried and leave the session unchanged.
    pub fn select_category(&mut self, selected: &str) -> Result<(), Error> {
        let category = Category::from_str(selected)?;
        self.load(category);
        Ok(())
    }

    /// Handle a change of the selected table row.
    pub fn select_row(&mut self, selection: Option<usize>) {
        self.selection = selection;
        self.marker = project(&self.rows, self.selection, &self.fields);
        self.notify(false);
    }

    /// Replace the visible rows with rows supplied by the UI, e.g. after it
    /// sorted or filtered the table itself.
    pub fn replace_rows(&mut self, rows: Vec<Record>) {
        self.rows = Arc::from(rows);
        self.recompute();
    }

    fn load(&mut self, category: Category) {
        let records = degrade(self.shelter.query(&category.resolve()));
        debug!("Category {} selected, {} records visible", category, records.len());
        self.category = category;
        self.rows = Arc::from(records);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.histogram = histogram(&self.rows);
        self.marker = project(&self.rows, self.selection, &self.fields);
        self.notify(true);
    }

    fn notify(&mut self, rows_changed: bool) {
        let mut renderers = std::mem::take(&mut self.renderers);
        for renderer in renderers.iter_mut() {
            self.render_to(renderer.as_mut(), rows_changed);
        }
        self.renderers = renderers;
    }

    fn render_to(&self, renderer: &mut dyn Render, rows_changed: bool) {
        if rows_changed {
            renderer.table(&self.rows);
            renderer.chart(&self.chart());
        }
        renderer.map(&self.map());
    }

    /// The category whose records were last loaded.
    pub fn category(&self) -> Category {
        self.category
    }

    /// A shared handle to the current visible rows.
    pub fn rows(&self) -> Arc<[Record]> {
        Arc::clone(&self.rows)
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn chart(&self) -> BarChart {
        BarChart::from(&self.histogram)
    }

    pub fn marker(&self) -> Option<&MarkerView> {
        self.marker.as_ref()
    }

    pub fn map(&self) -> MapView {
        MapView::from(self.marker.clone())
    }

    /// A paged table over the current visible rows.
    pub fn table(&self, page_size: usize) -> Table<'_> {
        Table::new(&self.rows, page_size)
    }
}
