//! In-memory media element and engines for controller tests.

use std::sync::{Arc, Mutex};

use super::engine::{
    DashEngine, EngineProvider, EventSink, HlsConfig, HlsEngine, MpegTsConfig, MpegTsEngine,
    ProtectionData, StreamSource,
};
use super::media::{MediaElement, ReadyState, SharedMedia, TimeRange};
use crate::error::{BackendError, PlayError};
use crate::models::Capabilities;

/// Shared, ordered record of calls made on fakes
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

struct MediaState {
    source: Option<String>,
    paused: bool,
    volume: f64,
    muted: bool,
    current_time: f64,
    buffered: Vec<TimeRange>,
    ready_state: ReadyState,
    error: bool,
    play_result: Result<(), PlayError>,
    error_sink: Option<EventSink>,
}

pub struct FakeMedia {
    state: Mutex<MediaState>,
    pub log: CallLog,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::with_log(CallLog::default())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            state: Mutex::new(MediaState {
                source: None,
                paused: true,
                volume: 1.0,
                muted: false,
                current_time: 0.0,
                buffered: Vec::new(),
                ready_state: ReadyState::HaveNothing,
                error: false,
                play_result: Ok(()),
                error_sink: None,
            }),
            log,
        }
    }

    pub fn set_playback(&self, current_time: f64, buffered: Vec<TimeRange>, ready_state: ReadyState) {
        let mut state = self.state.lock().unwrap();
        state.current_time = current_time;
        state.buffered = buffered;
        state.ready_state = ready_state;
    }

    pub fn set_element_error(&self, error: bool) {
        self.state.lock().unwrap().error = error;
    }

    /// Outcome of every following play request
    pub fn set_play_result(&self, result: Result<(), PlayError>) {
        self.state.lock().unwrap().play_result = result;
    }

    /// Fire the element's error event, if anyone listens
    pub fn fire_error(&self, detail: &str) {
        let sink = {
            let mut state = self.state.lock().unwrap();
            state.error = true;
            state.error_sink.clone()
        };
        if let Some(sink) = sink {
            sink.media_error(detail);
        }
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().unwrap().source.clone()
    }

    pub fn has_error_sink(&self) -> bool {
        self.state.lock().unwrap().error_sink.is_some()
    }

    pub fn volume(&self) -> f64 {
        self.state.lock().unwrap().volume
    }

    pub fn muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }
}

impl MediaElement for FakeMedia {
    fn set_source(&self, url: &str) {
        self.log.push(format!("media.set_source:{}", url));
        self.state.lock().unwrap().source = Some(url.to_string());
    }

    fn clear_source(&self) {
        self.log.push("media.clear_source");
        let mut state = self.state.lock().unwrap();
        state.source = None;
        state.error = false;
        state.paused = true;
    }

    fn play(&self) -> Result<(), PlayError> {
        self.log.push("media.play");
        let mut state = self.state.lock().unwrap();
        let result = state.play_result.clone();
        if result.is_ok() {
            state.paused = false;
        }
        result
    }

    fn pause(&self) {
        self.log.push("media.pause");
        self.state.lock().unwrap().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().unwrap().volume = volume;
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().unwrap().muted = muted;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn buffered(&self) -> Vec<TimeRange> {
        self.state.lock().unwrap().buffered.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().unwrap().ready_state
    }

    fn has_error(&self) -> bool {
        self.state.lock().unwrap().error
    }

    fn set_error_sink(&self, sink: Option<EventSink>) {
        self.state.lock().unwrap().error_sink = sink;
    }
}

/// Tracks how many engines are attached at once
#[derive(Clone, Default)]
pub struct AttachCounter(Arc<Mutex<(usize, usize)>>);

impl AttachCounter {
    fn attached(&self) {
        let mut counts = self.0.lock().unwrap();
        counts.0 += 1;
        counts.1 = counts.1.max(counts.0);
    }

    fn released(&self) {
        let mut counts = self.0.lock().unwrap();
        counts.0 = counts.0.saturating_sub(1);
    }

    pub fn live(&self) -> usize {
        self.0.lock().unwrap().0
    }

    pub fn max_live(&self) -> usize {
        self.0.lock().unwrap().1
    }
}

/// Engine provider whose engines record calls and expose their event sinks
#[derive(Clone)]
pub struct FakeProvider {
    pub caps: Capabilities,
    pub log: CallLog,
    pub counter: AttachCounter,
    sinks: Arc<Mutex<Vec<EventSink>>>,
    fail_attach: Arc<Mutex<bool>>,
}

impl FakeProvider {
    pub fn new(log: CallLog) -> Self {
        Self {
            caps: Capabilities {
                segmented_ts_flv: true,
                hls_engine: true,
                native_hls: false,
            },
            log,
            counter: AttachCounter::default(),
            sinks: Arc::new(Mutex::new(Vec::new())),
            fail_attach: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Make every following engine attach fail
    pub fn fail_attach(&self) {
        *self.fail_attach.lock().unwrap() = true;
    }

    /// Sink handed to the most recently attached engine
    pub fn last_sink(&self) -> EventSink {
        self.sinks.lock().unwrap().last().cloned().expect("no engine attached yet")
    }

    fn attach(&self, name: &str, events: EventSink) -> Result<(), BackendError> {
        self.log.push(format!("{}.attach", name));
        if *self.fail_attach.lock().unwrap() {
            return Err(BackendError::Setup(format!("{} attach refused", name)));
        }
        self.counter.attached();
        self.sinks.lock().unwrap().push(events);
        Ok(())
    }

    fn engine(&self, name: &'static str) -> FakeEngine {
        FakeEngine {
            name,
            provider: self.clone(),
            attached: false,
        }
    }
}

impl EngineProvider for FakeProvider {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn create_dash(&self) -> Result<Box<dyn DashEngine>, BackendError> {
        self.log.push("dash.create");
        Ok(Box::new(self.engine("dash")))
    }

    fn create_mpegts(&self, config: &MpegTsConfig) -> Result<Box<dyn MpegTsEngine>, BackendError> {
        self.log.push(format!(
            "mpegts.create:{:?}:live={}",
            config.container, config.is_live
        ));
        Ok(Box::new(self.engine("mpegts")))
    }

    fn create_hls(&self, config: &HlsConfig) -> Result<Box<dyn HlsEngine>, BackendError> {
        self.log.push(format!(
            "hls.create:worker={}:timeout={}",
            config.enable_worker,
            config.manifest_load_timeout.as_millis()
        ));
        Ok(Box::new(self.engine("hls")))
    }
}

pub struct FakeEngine {
    name: &'static str,
    provider: FakeProvider,
    attached: bool,
}

impl FakeEngine {
    fn log(&self, op: &str) {
        self.provider.log.push(format!("{}.{}", self.name, op));
    }

    fn attach(&mut self, events: EventSink) -> Result<(), BackendError> {
        self.provider.attach(self.name, events)?;
        self.attached = true;
        Ok(())
    }

    fn release(&mut self, op: &str) {
        self.log(op);
        if self.attached {
            self.attached = false;
            self.provider.counter.released();
        }
    }
}

impl DashEngine for FakeEngine {
    fn set_protection_data(&mut self, data: ProtectionData) {
        let mut systems: Vec<_> = data.keys().cloned().collect();
        systems.sort();
        self.log(&format!("protection:{}", systems.join(",")));
    }

    fn initialize(
        &mut self,
        _media: SharedMedia,
        source: &StreamSource,
        autoplay: bool,
        events: EventSink,
    ) -> Result<(), BackendError> {
        self.log(&format!("initialize:{}:autoplay={}", source.url, autoplay));
        self.attach(events)
    }

    fn reset(&mut self) {
        self.release("reset");
    }
}

impl MpegTsEngine for FakeEngine {
    fn attach_media(&mut self, _media: SharedMedia, events: EventSink) -> Result<(), BackendError> {
        self.attach(events)
    }

    fn load(&mut self) -> Result<(), BackendError> {
        self.log("load");
        Ok(())
    }

    fn unload(&mut self) {
        self.log("unload");
    }

    fn detach_media(&mut self) {
        self.log("detach");
    }

    fn destroy(&mut self) {
        self.release("destroy");
    }
}

impl HlsEngine for FakeEngine {
    fn load_source(&mut self, url: &str) {
        self.log(&format!("load_source:{}", url));
    }

    fn attach_media(&mut self, _media: SharedMedia, events: EventSink) -> Result<(), BackendError> {
        self.attach(events)
    }

    fn start_load(&mut self) {
        self.log("start_load");
    }

    fn recover_media_error(&mut self) {
        self.log("recover_media");
    }

    fn destroy(&mut self) {
        self.release("destroy");
    }
}
