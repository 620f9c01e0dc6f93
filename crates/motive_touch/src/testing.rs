//! Fake collaborators for unit tests

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use motive_animation::Action;
use motive_core::{CapturingSession, ComponentId, MotionConfig, Point, Transform2D};
use rustc_hash::FxHashMap;

use crate::collaborators::{
    PageDirection, Pager, Scrollable, SwipeChild, SwipeDirection, SwipeHost, TapTarget,
};
use crate::context::MotionContext;

static NEXT_COMPONENT: AtomicU64 = AtomicU64::new(1);

fn next_component() -> ComponentId {
    NEXT_COMPONENT.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn test_context() -> MotionContext {
    MotionContext::new(MotionConfig::testing())
}

pub(crate) fn capturing_context() -> (MotionContext, Arc<CapturingSession>) {
    let session = CapturingSession::new();
    let context = test_context().with_session(session.clone());
    (context, session)
}

/// Vertical list of `content` units shown through a `viewport`
pub(crate) struct FakeScrollable {
    id: ComponentId,
    viewport: f32,
    content: f32,
    position: Mutex<f32>,
    snap: Mutex<(Point, bool)>,
    transform: Mutex<Transform2D>,
}

impl FakeScrollable {
    pub fn vertical(viewport: f32, content: f32) -> Arc<Self> {
        Arc::new(Self {
            id: next_component(),
            viewport,
            content,
            position: Mutex::new(0.0),
            snap: Mutex::new((Point::ZERO, false)),
            transform: Mutex::new(Transform2D::IDENTITY),
        })
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn position(&self) -> f32 {
        *self.position.lock().unwrap()
    }

    pub fn set_snap(&self, offset: Point, force: bool) {
        *self.snap.lock().unwrap() = (offset, force);
    }

    pub fn set_transform(&self, transform: Transform2D) {
        *self.transform.lock().unwrap() = transform;
    }
}

impl Scrollable for FakeScrollable {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn is_vertical(&self) -> bool {
        true
    }

    fn scroll_position(&self) -> Point {
        Point::new(0.0, self.position())
    }

    fn trim_scroll(&self, candidate: Point) -> Point {
        let max = (self.content - self.viewport).max(0.0);
        Point::new(0.0, candidate.y.clamp(0.0, max))
    }

    fn set_scroll_position(&self, value: f32) {
        *self.position.lock().unwrap() = value;
    }

    fn snap_offset(&self) -> Point {
        self.snap.lock().unwrap().0
    }

    fn should_force_snap(&self) -> bool {
        self.snap.lock().unwrap().1
    }

    fn global_to_local(&self) -> Transform2D {
        *self.transform.lock().unwrap()
    }

    fn viewport(&self) -> Point {
        Point::new(self.viewport, self.viewport)
    }
}

/// Horizontal pager of square pages
pub(crate) struct FakePager {
    id: ComponentId,
    count: usize,
    width: f32,
    rtl: AtomicBool,
    current: AtomicUsize,
    available: Mutex<PageDirection>,
    transforms: Mutex<FxHashMap<usize, Transform2D>>,
    transform: Mutex<Transform2D>,
    commit_with: Mutex<Option<MotionContext>>,
}

impl FakePager {
    pub fn horizontal(count: usize, width: f32) -> Arc<Self> {
        Arc::new(Self {
            id: next_component(),
            count,
            width,
            rtl: AtomicBool::new(false),
            current: AtomicUsize::new(0),
            available: Mutex::new(PageDirection::Both),
            transforms: Mutex::new(FxHashMap::default()),
            transform: Mutex::new(Transform2D::IDENTITY),
            commit_with: Mutex::new(None),
        })
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Commit the settled page through `set_page` when a page move ends
    pub fn commit_on_move_end(&self, context: &MotionContext) {
        *self.commit_with.lock().unwrap() = Some(context.clone());
    }

    /// Transform last written for `page`
    pub fn transform(&self, page: usize) -> Transform2D {
        self.transforms
            .lock()
            .unwrap()
            .get(&page)
            .copied()
            .unwrap_or(Transform2D::IDENTITY)
    }

    pub fn set_rtl(&self, rtl: bool) {
        self.rtl.store(rtl, Ordering::SeqCst);
    }

    pub fn set_available(&self, direction: PageDirection) {
        *self.available.lock().unwrap() = direction;
    }

    pub fn set_transform(&self, transform: Transform2D) {
        *self.transform.lock().unwrap() = transform;
    }
}

impl Pager for FakePager {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn is_horizontal(&self) -> bool {
        true
    }

    fn is_rtl(&self) -> bool {
        self.rtl.load(Ordering::SeqCst)
    }

    fn global_to_local(&self) -> Transform2D {
        *self.transform.lock().unwrap()
    }

    fn size(&self) -> Point {
        Point::new(self.width, self.width)
    }

    fn page_count(&self) -> usize {
        self.count
    }

    fn current_page(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    fn available_direction(&self) -> PageDirection {
        *self.available.lock().unwrap()
    }

    fn set_current_page(&self, index: usize) {
        self.current.store(index, Ordering::SeqCst);
    }

    fn set_page_transform(&self, index: usize, transform: Transform2D) {
        self.transforms.lock().unwrap().insert(index, transform);
    }

    fn on_page_move_end(&self, _fulfilled: bool, done: &Action) {
        let context = self.commit_with.lock().unwrap().clone();
        if let Some(context) = context {
            crate::commands::set_page(&context, self, self.current_page());
        }
        done.resolve();
    }
}

/// Swipe host recording every call it receives
pub(crate) struct FakeSwipeHost {
    id: ComponentId,
    size: Point,
    rtl: AtomicBool,
    transform: Mutex<Transform2D>,
    injected_above: Mutex<Option<bool>>,
    children: Mutex<FxHashMap<SwipeChild, Transform2D>>,
    original_removed: AtomicUsize,
    replacement_removed: AtomicUsize,
    moves: Mutex<Vec<f32>>,
    done: Mutex<Vec<Option<SwipeDirection>>>,
    on_done: Mutex<Option<Box<dyn Fn() + Send>>>,
    disabled: AtomicBool,
}

impl FakeSwipeHost {
    pub fn new(width: f32, height: f32) -> Arc<Self> {
        Arc::new(Self {
            id: next_component(),
            size: Point::new(width, height),
            rtl: AtomicBool::new(false),
            transform: Mutex::new(Transform2D::IDENTITY),
            injected_above: Mutex::new(None),
            children: Mutex::new(FxHashMap::default()),
            original_removed: AtomicUsize::new(0),
            replacement_removed: AtomicUsize::new(0),
            moves: Mutex::new(Vec::new()),
            done: Mutex::new(Vec::new()),
            on_done: Mutex::new(None),
            disabled: AtomicBool::new(false),
        })
    }

    pub fn set_rtl(&self, rtl: bool) {
        self.rtl.store(rtl, Ordering::SeqCst);
    }

    pub fn set_transform(&self, transform: Transform2D) {
        *self.transform.lock().unwrap() = transform;
    }

    pub fn injected_above(&self) -> Option<bool> {
        *self.injected_above.lock().unwrap()
    }

    pub fn has_transform(&self, child: SwipeChild) -> bool {
        self.children.lock().unwrap().contains_key(&child)
    }

    pub fn transform(&self, child: SwipeChild) -> Transform2D {
        self.children
            .lock()
            .unwrap()
            .get(&child)
            .copied()
            .unwrap_or(Transform2D::IDENTITY)
    }

    pub fn original_removed(&self) -> usize {
        self.original_removed.load(Ordering::SeqCst)
    }

    pub fn replacement_removed(&self) -> usize {
        self.replacement_removed.load(Ordering::SeqCst)
    }

    pub fn last_move(&self) -> Option<f32> {
        self.moves.lock().unwrap().last().copied()
    }

    pub fn done(&self) -> Vec<Option<SwipeDirection>> {
        self.done.lock().unwrap().clone()
    }

    /// Run `f` every time a swipe completes
    pub fn set_on_done(&self, f: impl Fn() + Send + 'static) {
        *self.on_done.lock().unwrap() = Some(Box::new(f));
    }

    pub fn gestures_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }
}

impl SwipeHost for FakeSwipeHost {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn is_rtl(&self) -> bool {
        self.rtl.load(Ordering::SeqCst)
    }

    fn global_to_local(&self) -> Transform2D {
        *self.transform.lock().unwrap()
    }

    fn size(&self) -> Point {
        self.size
    }

    fn inject_replacement(&self, above: bool) {
        *self.injected_above.lock().unwrap() = Some(above);
    }

    fn set_child_transform(&self, child: SwipeChild, transform: Transform2D) {
        self.children.lock().unwrap().insert(child, transform);
    }

    fn remove_replacement(&self) {
        self.replacement_removed.fetch_add(1, Ordering::SeqCst);
    }

    fn remove_original(&self) {
        self.original_removed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_swipe_move(&self, position: f32, _direction: SwipeDirection) {
        self.moves.lock().unwrap().push(position);
    }

    fn on_swipe_done(&self, direction: Option<SwipeDirection>) {
        self.done.lock().unwrap().push(direction);
        if let Some(on_done) = self.on_done.lock().unwrap().as_ref() {
            on_done();
        }
    }

    fn disable_gestures(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct FakeTapTarget {
    presses: AtomicUsize,
}

impl FakeTapTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            presses: AtomicUsize::new(0),
        })
    }

    pub fn presses(&self) -> usize {
        self.presses.load(Ordering::SeqCst)
    }
}

impl TapTarget for FakeTapTarget {
    fn global_to_local(&self) -> Transform2D {
        Transform2D::IDENTITY
    }

    fn on_press(&self) {
        self.presses.fetch_add(1, Ordering::SeqCst);
    }
}
