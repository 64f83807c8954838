use crate::demo::{DessertEdit, DessertTable};
use crate::error::Result;
use crate::filter::{FilterOptions, FilterSelection, VendorChoice};
use crate::pipeline::{DemoReport, SalesData, SalesReport, run_demo_pipeline, run_sales_pipeline};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// What a session remembers between interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub selection: FilterSelection,
    pub desserts: DessertTable,
}

impl SessionState {
    /// Fresh state: every region, all vendors, the default dessert table
    pub fn initial(options: &FilterOptions) -> Self {
        SessionState {
            selection: FilterSelection::default_for(options),
            desserts: DessertTable::default(),
        }
    }
}

/// A single user interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SelectRegions { regions: Vec<String> },
    SelectVendor { vendor: VendorChoice },
    EditDesserts { edit: DessertEdit },
    ResetDesserts,
    RefreshSales,
    RefreshDemo,
}

/// Dashboard page an event re-renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Sales,
    Demo,
}

impl Event {
    pub fn page(&self) -> Page {
        match self {
            Event::SelectRegions { .. } | Event::SelectVendor { .. } | Event::RefreshSales => {
                Page::Sales
            }
            Event::EditDesserts { .. } | Event::ResetDesserts | Event::RefreshDemo => Page::Demo,
        }
    }
}

/// Applies one event to a state
///
/// Pure: the input state is never modified.
///
/// # Errors
/// * `UnknownOption` - A region or vendor that is not offered
/// * `RowOutOfRange` - A dessert edit addressing a missing row
pub fn reduce(state: &SessionState, event: &Event, options: &FilterOptions) -> Result<SessionState> {
    let mut next = state.clone();
    match event {
        Event::SelectRegions { regions } => {
            options.validate_regions(regions)?;
            next.selection.regions = regions.iter().cloned().collect();
        }
        Event::SelectVendor { vendor } => {
            options.validate_vendor(vendor)?;
            next.selection.vendor = vendor.clone();
        }
        Event::EditDesserts { edit } => next.desserts = state.desserts.apply(edit)?,
        Event::ResetDesserts => next.desserts = DessertTable::default(),
        Event::RefreshSales | Event::RefreshDemo => {}
    }
    Ok(next)
}

/// Render output for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Render {
    pub page: Page,
    pub options: FilterOptions,
    pub selection: FilterSelection,
    /// Vendor select box entries, "All" first
    pub vendor_choices: Vec<String>,
    pub sales: Option<SalesReport>,
    pub demo: Option<DemoReport>,
    /// Set when the sales file could not be loaded
    pub load_error: Option<String>,
    /// Set when the event was rejected and the previous state kept
    pub rejected: Option<String>,
}

/// Fixed inputs shared by every transition
pub struct RenderContext<'a> {
    pub sales: &'a SalesData,
    pub histogram_samples: usize,
    pub histogram_bins: usize,
}

/// One full interaction: reduce, then render the affected page
///
/// A rejected event keeps the previous state and is reported in
/// `Render::rejected`; the page still renders.
pub fn step<R: Rng + ?Sized>(
    state: &SessionState,
    event: &Event,
    ctx: &RenderContext<'_>,
    rng: &mut R,
) -> (SessionState, Render) {
    let options = ctx.sales.options();
    let (next, rejected) = match reduce(state, event, &options) {
        Ok(next) => (next, None),
        Err(e) => {
            warn!("Rejected {:?}: {}", event, e);
            (state.clone(), Some(e.to_string()))
        }
    };
    debug!("Session step {:?} -> {:?}", event, next.selection);

    let render = render(&next, event.page(), ctx, rng, options, rejected);
    (next, render)
}

/// Renders a page for a state without applying any event
pub fn render<R: Rng + ?Sized>(
    state: &SessionState,
    page: Page,
    ctx: &RenderContext<'_>,
    rng: &mut R,
    options: FilterOptions,
    rejected: Option<String>,
) -> Render {
    let mut render = Render {
        page,
        vendor_choices: options.vendor_choices(),
        options,
        selection: state.selection.clone(),
        sales: None,
        demo: None,
        load_error: None,
        rejected,
    };

    match (page, ctx.sales) {
        (Page::Sales, SalesData::Loaded { table, .. }) => {
            render.sales = Some(run_sales_pipeline(table, &state.selection));
        }
        (Page::Sales, SalesData::Failed { message }) => {
            render.load_error = Some(message.clone());
        }
        (Page::Demo, _) => {
            render.demo = Some(run_demo_pipeline(
                &state.desserts,
                rng,
                ctx.histogram_samples,
                ctx.histogram_bins,
            ));
        }
    }

    render
}

/// Session data with its expiry
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub expires_at: SystemTime,
}

/// In-memory session states keyed by session id
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores a state under a new random id
    ///
    /// # Returns
    /// * `String` - The new session id
    pub fn create(&self, state: SessionState) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.put(&session_id, state);
        session_id
    }

    /// State of a live session; expired sessions read as absent
    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(session_id)
            .filter(|s| s.expires_at > SystemTime::now())
            .map(|s| s.state.clone())
    }

    /// Replaces a session's state and pushes back its expiry
    pub fn put(&self, session_id: &str, state: SessionState) {
        let session = Session {
            state,
            expires_at: SystemTime::now() + self.ttl,
        };
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session_id.to_string(), session);
    }

    /// Looks up `session_id`, creating a session from `init` when it is
    /// absent or expired
    pub fn get_or_create(
        &self,
        session_id: Option<&str>,
        init: impl FnOnce() -> SessionState,
    ) -> (String, SessionState) {
        if let Some(id) = session_id {
            if let Some(state) = self.get(id) {
                return (id.to_string(), state);
            }
        }
        let state = init();
        let id = self.create(state.clone());
        (id, state)
    }

    /// Runs `f` over a session's state and stores the state it returns
    ///
    /// The write lock is held from read to store, so concurrent updates of
    /// one session apply one after the other. An absent or expired session
    /// starts from `init`.
    pub fn update<T>(
        &self,
        session_id: &str,
        init: impl FnOnce() -> SessionState,
        f: impl FnOnce(&SessionState) -> (SessionState, T),
    ) -> T {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap();
        let current = match sessions.get(session_id) {
            Some(session) if session.expires_at > now => session.state.clone(),
            _ => init(),
        };

        let (state, out) = f(&current);
        sessions.insert(
            session_id.to_string(),
            Session {
                state,
                expires_at: now + self.ttl,
            },
        );
        out
    }

    /// Drops expired sessions
    ///
    /// # Returns
    /// * `usize` - Number of sessions removed
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::Dessert;
    use crate::error::DashboardError;
    use crate::loader::{RecordTable, SaleRecord};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sales() -> SalesData {
        SalesData::from_table(RecordTable::from_records(vec![
            SaleRecord::new(Some("North"), Some("Acme"), Some(10), Some(100.0), Some(100.0)),
            SaleRecord::new(Some("South"), Some("Globex"), Some(5), Some(50.0), Some(50.0)),
        ]))
    }

    fn ctx(sales: &SalesData) -> RenderContext<'_> {
        RenderContext {
            sales,
            histogram_samples: 100,
            histogram_bins: 10,
        }
    }

    #[test]
    fn reduce_leaves_input_state_untouched() {
        let options = sales().options();
        let state = SessionState::initial(&options);
        let event = Event::SelectRegions {
            regions: vec!["North".to_string()],
        };

        let next = reduce(&state, &event, &options).unwrap();
        assert_eq!(state.selection.regions.len(), 2);
        assert_eq!(next.selection.regions.len(), 1);
    }

    #[test]
    fn reduce_rejects_unknown_vendor() {
        let options = sales().options();
        let state = SessionState::initial(&options);
        let event = Event::SelectVendor {
            vendor: VendorChoice::parse("Initech"),
        };
        assert!(matches!(
            reduce(&state, &event, &options),
            Err(DashboardError::UnknownOption { .. })
        ));
    }

    #[test]
    fn step_renders_filtered_sales() {
        let sales = sales();
        let ctx = ctx(&sales);
        let mut rng = StdRng::seed_from_u64(3);
        let state = SessionState::initial(&sales.options());

        let (state, render) = step(
            &state,
            &Event::SelectVendor {
                vendor: VendorChoice::parse("Globex"),
            },
            &ctx,
            &mut rng,
        );
        let report = render.sales.unwrap();
        assert_eq!(report.metrics.total_units, 5);
        assert_eq!(render.vendor_choices, vec!["All", "Acme", "Globex"]);
        assert!(render.demo.is_none());

        // selections persist across steps
        let (_, render) = step(
            &state,
            &Event::SelectRegions { regions: vec![] },
            &ctx,
            &mut rng,
        );
        let report = render.sales.unwrap();
        assert!(report.rows.is_empty());
        assert!(report.metrics.average_sales.is_nan());
        assert_eq!(render.selection.vendor, VendorChoice::parse("Globex"));
    }

    #[test]
    fn rejected_step_keeps_previous_state() {
        let sales = sales();
        let ctx = ctx(&sales);
        let mut rng = StdRng::seed_from_u64(4);
        let state = SessionState::initial(&sales.options());

        let (next, render) = step(
            &state,
            &Event::SelectRegions {
                regions: vec!["Atlantis".to_string()],
            },
            &ctx,
            &mut rng,
        );
        assert_eq!(next, state);
        assert!(render.rejected.unwrap().contains("Atlantis"));
        assert_eq!(render.sales.unwrap().rows.len(), 2);
    }

    #[test]
    fn demo_edits_flow_into_favourite() {
        let sales = sales();
        let ctx = ctx(&sales);
        let mut rng = StdRng::seed_from_u64(5);
        let state = SessionState::initial(&sales.options());

        let (state, render) = step(
            &state,
            &Event::EditDesserts {
                edit: DessertEdit::AddRow {
                    dessert: Dessert::new("tres leches", 10, false),
                },
            },
            &ctx,
            &mut rng,
        );
        assert_eq!(render.demo.unwrap().favorite.as_deref(), Some("tres leches"));

        let (state, render) = step(&state, &Event::ResetDesserts, &ctx, &mut rng);
        assert_eq!(state.desserts, DessertTable::default());
        assert_eq!(render.demo.unwrap().favorite.as_deref(), Some("helado"));
    }

    #[test]
    fn failed_load_is_reported_but_demo_works() {
        let sales = SalesData::Failed {
            message: "failed to load ./sellers.csv: missing".to_string(),
        };
        let ctx = ctx(&sales);
        let mut rng = StdRng::seed_from_u64(6);
        let state = SessionState::initial(&sales.options());

        let (_, render) = step(&state, &Event::RefreshSales, &ctx, &mut rng);
        assert!(render.sales.is_none());
        assert!(render.load_error.is_some());

        let (_, render) = step(&state, &Event::RefreshDemo, &ctx, &mut rng);
        assert!(render.demo.is_some());
    }

    #[test]
    fn events_deserialize_from_ui_json() {
        let event: Event =
            serde_json::from_str(r#"{"type":"select_vendor","vendor":"All"}"#).unwrap();
        assert_eq!(event, Event::SelectVendor { vendor: VendorChoice::All });

        let event: Event = serde_json::from_str(
            r#"{"type":"edit_desserts","edit":{"op":"set_rating","row":1,"rating":2}}"#,
        )
        .unwrap();
        assert_eq!(event.page(), Page::Demo);
    }

    #[test]
    fn store_round_trips_and_expires() {
        let store = SessionStore::new(Duration::from_secs(60));
        let options = sales().options();
        let id = store.create(SessionState::initial(&options));
        assert!(store.get(&id).is_some());
        assert!(store.get("no-such-session").is_none());

        let (same, _) = store.get_or_create(Some(&id), || unreachable!());
        assert_eq!(same, id);

        let expired = SessionStore::new(Duration::ZERO);
        let stale = expired.create(SessionState::initial(&options));
        assert!(expired.get(&stale).is_none());
        assert_eq!(expired.purge_expired(), 1);
        assert!(expired.is_empty());

        let (fresh, _) = expired.get_or_create(Some(&stale), || SessionState::initial(&options));
        assert_ne!(fresh, stale);
    }

    #[test]
    fn concurrent_updates_of_one_session_both_stick() {
        let sales = sales();
        let ctx = ctx(&sales);
        let options = sales.options();
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create(SessionState::initial(&options));

        let events = [
            Event::SelectRegions {
                regions: vec!["North".to_string()],
            },
            Event::SelectVendor {
                vendor: VendorChoice::parse("Acme"),
            },
        ];
        std::thread::scope(|scope| {
            for (seed, event) in events.iter().enumerate() {
                let (store, ctx, options, id) = (&store, &ctx, &options, &id);
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed as u64);
                    store.update(
                        id,
                        || SessionState::initial(options),
                        |state| step(state, event, ctx, &mut rng),
                    )
                });
            }
        });

        let state = store.get(&id).unwrap();
        assert_eq!(state.selection.regions.len(), 1);
        assert!(state.selection.regions.contains("North"));
        assert_eq!(state.selection.vendor, VendorChoice::parse("Acme"));
    }

    #[test]
    fn update_starts_missing_sessions_from_init() {
        let options = sales().options();
        let store = SessionStore::new(Duration::from_secs(60));
        let regions = store.update(
            "fresh",
            || SessionState::initial(&options),
            |state| (state.clone(), state.selection.regions.len()),
        );
        assert_eq!(regions, 2);
        assert!(store.get("fresh").is_some());
    }
}
