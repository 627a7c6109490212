use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use bidi_pager::{parse_markup, tokenize, Chapter, Document, Paragraph};
use bidi_pager_render::{LayoutConfig, Page, PaginationSession};

const DISPLAY_WIDTH: i32 = 480;
const DISPLAY_HEIGHT: i32 = 800;
const SYNTHETIC_PARAGRAPHS: usize = 400;

const RTL_LINE: &str = "این یک متن تستی است که با کلمه‌های English و نشانه‌های (نگارشی) همراه است، و باید درست صفحه‌بندی شود.";
const LTR_LINE: &str = "A plain left-to-right paragraph, with \"quotes\", commas and an occasional متن to mix directions.";

static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

struct PeakTracker;

#[global_allocator]
static GLOBAL_ALLOCATOR: PeakTracker = PeakTracker;

fn live_bytes() -> usize {
    LIVE_BYTES.load(Ordering::Relaxed)
}

fn reset_peak() {
    PEAK_BYTES.store(live_bytes(), Ordering::Relaxed);
}

fn grow(bytes: usize) {
    let live = LIVE_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
    PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
}

fn shrink(bytes: usize) {
    let _ = LIVE_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
        Some(live.saturating_sub(bytes))
    });
}

unsafe impl GlobalAlloc for PeakTracker {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            shrink(layout.size());
            grow(new_size);
        }
        new_ptr
    }
}

#[derive(Clone, Debug)]
struct CaseResult {
    fixture: &'static str,
    case: &'static str,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    max_ns: u128,
    median_peak_heap_bytes: usize,
    max_peak_heap_bytes: usize,
}

fn median<T: Copy>(sorted: &[T]) -> T {
    sorted[sorted.len() / 2]
}

fn run_case<F>(
    fixture: &'static str,
    case: &'static str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }
    let mut times = Vec::with_capacity(measure_iters);
    let mut peaks = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let baseline = live_bytes();
        reset_peak();
        let start = Instant::now();
        black_box(op());
        times.push(start.elapsed().as_nanos());
        peaks.push(PEAK_BYTES.load(Ordering::Relaxed).saturating_sub(baseline));
    }
    times.sort_unstable();
    peaks.sort_unstable();
    CaseResult {
        fixture,
        case,
        iterations: measure_iters,
        min_ns: times[0],
        median_ns: median(&times),
        max_ns: times[times.len() - 1],
        median_peak_heap_bytes: median(&peaks),
        max_peak_heap_bytes: peaks[peaks.len() - 1],
    }
}

fn synthetic_document() -> Document {
    let paragraphs = (0..SYNTHETIC_PARAGRAPHS)
        .map(|i| {
            let line = if i % 3 == 0 { LTR_LINE } else { RTL_LINE };
            Paragraph::from_text(line, None).0
        })
        .collect::<Vec<_>>();
    let chapters = paragraphs
        .chunks(SYNTHETIC_PARAGRAPHS / 4)
        .map(|chunk| Chapter::new(chunk.to_vec()))
        .collect();
    Document::new(chapters)
}

fn all_pages(doc: &Document) -> Vec<Page> {
    let mut session =
        PaginationSession::with_config(doc, LayoutConfig::for_display(DISPLAY_WIDTH, DISPLAY_HEIGHT));
    let mut pages = Vec::new();
    let mut page = session
        .first_page()
        .unwrap_or_else(|e| panic!("first page failed: {}", e));
    while let Some(current) = page {
        page = session
            .build_next_page(&current)
            .unwrap_or_else(|e| panic!("next page failed: {}", e));
        pages.push(current);
    }
    pages
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 2 };
    let measure_iters = if quick { 3 } else { 10 };

    println!("# bidi-pager benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!("fixture,case,iterations,min_ns,median_ns,max_ns,median_peak_heap_bytes,max_peak_heap_bytes");

    let markup = std::fs::read_to_string("tests/fixtures/mixed.xml")
        .unwrap_or_else(|e| panic!("read fixture failed: {}", e));
    let mixed = parse_markup(&markup)
        .unwrap_or_else(|e| panic!("parse failed: {}", e))
        .document;
    let synthetic = synthetic_document();

    let mut results = vec![
        run_case("mixed", "parse_markup", warmup_iters, measure_iters, || {
            let loaded = parse_markup(&markup).unwrap_or_else(|e| panic!("parse failed: {}", e));
            loaded.document.paragraph_total()
        }),
        run_case("synthetic", "tokenize_line", warmup_iters, measure_iters, || {
            (0..SYNTHETIC_PARAGRAPHS)
                .map(|_| tokenize(RTL_LINE, None).words.len())
                .sum()
        }),
    ];

    for (fixture, doc) in [("mixed", &mixed), ("synthetic", &synthetic)] {
        results.push(run_case(fixture, "paginate_forward", warmup_iters, measure_iters, || {
            all_pages(doc).len()
        }));

        let pages = all_pages(doc);
        let last = pages.last().cloned();
        results.push(run_case(
            fixture,
            "paginate_backward_uncached",
            warmup_iters,
            measure_iters,
            || {
                let mut session = PaginationSession::with_config(
                    doc,
                    LayoutConfig::for_display(DISPLAY_WIDTH, DISPLAY_HEIGHT),
                );
                let mut count = 0usize;
                let mut page = last.clone();
                while let Some(current) = page {
                    count += 1;
                    page = session
                        .build_previous_page(&current)
                        .unwrap_or_else(|e| panic!("previous page failed: {}", e));
                }
                count
            },
        ));
    }

    for result in &results {
        println!(
            "{},{},{},{},{},{},{},{}",
            result.fixture,
            result.case,
            result.iterations,
            result.min_ns,
            result.median_ns,
            result.max_ns,
            result.median_peak_heap_bytes,
            result.max_peak_heap_bytes
        );
    }
}
