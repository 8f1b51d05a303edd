//! Client side of attempt recording.
//!
//! Clicking a land/miss control records one attempt, then re-reads the
//! trick's stats fragment and swaps it into the page:
//!
//! ```text
//! click #land-42 -> GET /attempt/42/true/false
//!                -> GET /get_single_trick_stats/42
//!                -> #trickstats42 = response body
//! ```
//!
//! The page and the network are behind the [`Page`] and [`Transport`]
//! traits. Only one chain per trick is in flight; a newer click on the
//! same trick aborts the older chain.

use crate::errors::RecorderError;
use crate::models::AttemptResponse;
use crate::transport::Transport;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

pub const SUCCESS_CLASS: &str = "btn-trick-success";
pub const MISS_CLASS: &str = "btn-trick-miss";
pub const PAST_SUCCESS_CLASS: &str = "btn-trick-past-success";
pub const PAST_MISS_CLASS: &str = "btn-trick-past-miss";
pub const STATS_CONTAINER_PREFIX: &str = "trickstats";
pub const GAME_CONTAINER: &str = "gamestats";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// The parts of a page element the recorder cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub id: String,
    pub classes: Vec<String>,
}

impl ElementDescriptor {
    pub fn new(id: impl Into<String>, classes: &[&str]) -> Self {
        Self {
            id: id.into(),
            classes: classes.iter().map(|class| class.to_string()).collect(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrickId(pub u32);

impl TrickId {
    /// Takes the second dash-separated token of an element id, so
    /// `land-42` and `trick-42-extra` both name trick 42.
    pub fn from_element_id(element_id: &str) -> Result<Self, RecorderError> {
        element_id
            .split('-')
            .nth(1)
            .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|token| token.parse().ok())
            .map(TrickId)
            .ok_or_else(|| RecorderError::MalformedElementId(element_id.to_string()))
    }

    pub fn stats_container(self) -> String {
        format!("{STATS_CONTAINER_PREFIX}{}", self.0)
    }
}

impl fmt::Display for TrickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a click on a control records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptControl {
    pub landed: bool,
    /// Attempt made by the user's past self during a game.
    pub past: bool,
}

impl AttemptControl {
    pub const LAND: Self = Self { landed: true, past: false };
    pub const MISS: Self = Self { landed: false, past: false };

    pub fn for_element(element: &ElementDescriptor) -> Option<Self> {
        if element.has_class(SUCCESS_CLASS) {
            Some(Self::LAND)
        } else if element.has_class(MISS_CLASS) {
            Some(Self::MISS)
        } else if element.has_class(PAST_SUCCESS_CLASS) {
            Some(Self { landed: true, past: true })
        } else if element.has_class(PAST_MISS_CLASS) {
            Some(Self { landed: false, past: true })
        } else {
            None
        }
    }
}

/// Server path built from typed segments, each percent-encoded on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
}

impl RequestPath {
    fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn attempt(trick: TrickId, landed: bool, past: bool) -> Self {
        Self::from_segments(vec![
            "attempt".to_string(),
            trick.to_string(),
            landed.to_string(),
            past.to_string(),
        ])
    }

    pub fn trick_stats(trick: TrickId) -> Self {
        Self::from_segments(vec!["get_single_trick_stats".to_string(), trick.to_string()])
    }

    pub fn game_stats() -> Self {
        Self::from_segments(vec!["get_game_stats".to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", utf8_percent_encode(segment, PATH_SEGMENT))?;
        }
        Ok(())
    }
}

/// The document the recorder writes into.
pub trait Page: Send + Sync + 'static {
    /// Replaces the inner markup of the element with id `container_id`.
    /// The markup is the server's fragment, used verbatim.
    fn replace_markup(&self, container_id: &str, markup: &str);

    fn notify_error(&self, error: &RecorderError);
}

pub type Chain = JoinHandle<Result<(), RecorderError>>;

struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

struct Inner<T, P> {
    transport: T,
    page: P,
    bound: Mutex<HashMap<String, AttemptControl>>,
    in_flight: Mutex<HashMap<TrickId, InFlight>>,
    next_generation: AtomicU64,
}

pub struct AttemptRecorder<T, P> {
    inner: Arc<Inner<T, P>>,
}

impl<T, P> Clone for AttemptRecorder<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport, P: Page> AttemptRecorder<T, P> {
    pub fn new(transport: T, page: P) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                page,
                bound: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn page(&self) -> &P {
        &self.inner.page
    }

    /// Registers every land/miss control among `elements` and returns how
    /// many were recognised. Elements without a control class are skipped.
    pub fn bind(&self, elements: impl IntoIterator<Item = ElementDescriptor>) -> usize {
        let mut bound = lock(&self.inner.bound);
        let mut count = 0;
        for element in elements {
            if let Some(control) = AttemptControl::for_element(&element) {
                bound.insert(element.id, control);
                count += 1;
            }
        }
        debug!(count, "bound attempt controls");
        count
    }

    /// Click on an element registered through [`bind`](Self::bind).
    pub fn click(&self, element_id: &str) -> Result<Chain, RecorderError> {
        let control = lock(&self.inner.bound).get(element_id).copied();
        match control {
            Some(control) => self.record_attempt_and_update(element_id, control),
            None => Err(RecorderError::NotAControl(element_id.to_string())),
        }
    }

    /// Delegated dispatch: the target is matched by class when the click
    /// happens, so controls added after [`bind`](Self::bind) still work.
    pub fn handle_click(&self, target: &ElementDescriptor) -> Result<Chain, RecorderError> {
        match AttemptControl::for_element(target) {
            Some(control) => self.record_attempt_and_update(&target.id, control),
            None => Err(RecorderError::NotAControl(target.id.clone())),
        }
    }

    /// Starts the record-then-refresh chain for the trick named by
    /// `element_id` on the current tokio runtime.
    pub fn record_attempt_and_update(
        &self,
        element_id: &str,
        control: AttemptControl,
    ) -> Result<Chain, RecorderError> {
        let started = TrickId::from_element_id(element_id).and_then(|trick| {
            Handle::try_current()
                .map(|runtime| (trick, runtime))
                .map_err(|err| RecorderError::NoRuntime(err.to_string()))
        });
        let (trick, runtime) = match started {
            Ok(started) => started,
            Err(err) => {
                warn!("ignoring click: {err}");
                self.inner.page.notify_error(&err);
                return Err(err);
            }
        };

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut in_flight = lock(&self.inner.in_flight);

        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move {
            let result = inner.run_chain(trick, control).await;
            inner.finish(trick, generation);
            result
        });

        let entry = InFlight {
            generation,
            abort: handle.abort_handle(),
        };
        if let Some(previous) = in_flight.insert(trick, entry) {
            debug!(%trick, "superseding in-flight attempt chain");
            previous.abort.abort();
        }

        Ok(handle)
    }

    /// Re-reads the stats fragment for `trick` and swaps it into the page.
    pub async fn refresh(&self, trick: TrickId) -> Result<(), RecorderError> {
        let result = self.inner.refresh(trick).await;
        if let Err(err) = &result {
            self.inner.page.notify_error(err);
        }
        result
    }

    /// Number of chains still running.
    pub fn in_flight(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }
}

impl<T: Transport, P: Page> Inner<T, P> {
    async fn run_chain(&self, trick: TrickId, control: AttemptControl) -> Result<(), RecorderError> {
        let result = self.record_then_refresh(trick, control).await;
        if let Err(err) = &result {
            warn!(%trick, "attempt chain failed: {err}");
            self.page.notify_error(err);
        }
        result
    }

    async fn record_then_refresh(
        &self,
        trick: TrickId,
        control: AttemptControl,
    ) -> Result<(), RecorderError> {
        let path = RequestPath::attempt(trick, control.landed, control.past);
        let body = self.transport.get(&path).await?;
        debug!(%path, response = %body, "attempt recorded");

        self.refresh(trick).await?;

        let update_game = match serde_json::from_str::<AttemptResponse>(&body) {
            Ok(response) => response.update_game,
            Err(err) => {
                debug!(%path, "attempt response is not an attempt report: {err}");
                false
            }
        };
        if update_game {
            let markup = self.transport.get(&RequestPath::game_stats()).await?;
            debug!(target_container = GAME_CONTAINER, response = %markup, "updating game");
            self.page.replace_markup(GAME_CONTAINER, &markup);
        }
        Ok(())
    }

    async fn refresh(&self, trick: TrickId) -> Result<(), RecorderError> {
        let markup = self.transport.get(&RequestPath::trick_stats(trick)).await?;
        let container = trick.stats_container();
        debug!(target_container = %container, response = %markup, "updating trick stats");
        self.page.replace_markup(&container, &markup);
        Ok(())
    }

    fn finish(&self, trick: TrickId, generation: u64) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight
            .get(&trick)
            .is_some_and(|entry| entry.generation == generation)
        {
            in_flight.remove(&trick);
        }
    }
}
