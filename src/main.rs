//! Ripple Grid entry point
//!
//! Web: mounts the grid into the page and runs the ripple loop.
//! Native: runs a seeded headless session and logs every ripple.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_grid {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{AnimationEvent, Document, HtmlElement, MouseEvent};

    use ripple_grid::platform::FrameClock;
    use ripple_grid::{Cell, PulseScheduler, RippleConfig};

    const RIPPLE_CLASS: &str = "animate-cell-ripple";
    const POP_CLASS: &str = "animate-center-pop";
    const POP_ANIMATION: &str = "center-pop";

    /// Grid instance: scheduler plus the DOM cells it drives
    struct Host {
        scheduler: PulseScheduler,
        clock: FrameClock,
        cells: Vec<HtmlElement>,
        center_index: usize,
        rendered_generation: u64,
    }

    impl Host {
        /// Advance the scheduler and restart animations if a new ripple started
        fn frame(&mut self, time: f64) {
            let dt = self.clock.tick(time);
            self.scheduler.advance(dt);

            for event in self.scheduler.drain_events() {
                log::debug!(
                    "Ripple #{} from ({}, {})",
                    event.generation,
                    event.origin.row,
                    event.origin.col
                );
            }

            if self.scheduler.snapshot().generation != self.rendered_generation {
                self.restart_animations();
            }
        }

        /// Write per-cell CSS variables and replay the CSS animations.
        /// The center pop always plays, so its `animationend` keeps the loop alive.
        fn restart_animations(&mut self) {
            for (idx, (el, frame)) in self
                .cells
                .iter()
                .zip(self.scheduler.cell_frames())
                .enumerate()
            {
                let style = el.style();
                for (name, value) in frame.style_properties() {
                    let _ = style.set_property(name, &value);
                }

                let classes = el.class_list();
                let _ = classes.remove_2(RIPPLE_CLASS, POP_CLASS);
                // Force reflow so re-adding the class restarts the animation
                let _ = el.offset_width();
                if frame.rippling {
                    let _ = classes.add_1(RIPPLE_CLASS);
                }
                if idx == self.center_index {
                    let _ = classes.add_1(POP_CLASS);
                }
            }
            self.rendered_generation = self.scheduler.snapshot().generation;
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Ripple grid starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let config = RippleConfig::load();
        let scheduler = match PulseScheduler::new(config) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                log::error!("Invalid ripple config: {}", e);
                return;
            }
        };

        let Some(container) = document
            .get_element_by_id("ripple-grid")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            log::error!("No #ripple-grid element found");
            return;
        };

        let grid = *scheduler.grid();
        let size = grid.pixel_size();
        let container_style = container.style();
        let _ = container_style.set_property("display", "grid");
        let _ = container_style.set_property(
            "grid-template-columns",
            &format!("repeat({}, {}px)", grid.cols, grid.cell_size),
        );
        let _ = container_style.set_property(
            "grid-template-rows",
            &format!("repeat({}, {}px)", grid.rows, grid.cell_size),
        );
        let _ = container_style.set_property("width", &format!("{}px", size.x));
        let _ = container_style.set_property("height", &format!("{}px", size.y));

        let cells = match create_cells(&document, &container, grid.cells()) {
            Some(cells) => cells,
            None => {
                log::error!("Failed to create grid cells");
                return;
            }
        };
        let center_index = grid.index_of(grid.center_cell()).unwrap_or_default();

        let host = Rc::new(RefCell::new(Host {
            scheduler,
            clock: FrameClock::new(),
            cells,
            center_index,
            rendered_generation: 0,
        }));

        // Start the center pop right away, even before any ripple
        host.borrow_mut().restart_animations();

        setup_cell_handlers(host.clone(), grid.cells().collect());
        setup_teardown(host.clone());

        request_animation_frame(host);

        log::info!("Ripple grid running!");
    }

    fn create_cells(
        document: &Document,
        container: &HtmlElement,
        cells: impl Iterator<Item = Cell>,
    ) -> Option<Vec<HtmlElement>> {
        cells
            .map(|cell| {
                let el: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
                el.set_class_name("cell");
                let _ = el.set_attribute("data-row", &cell.row.to_string());
                let _ = el.set_attribute("data-col", &cell.col.to_string());
                container.append_child(&el).ok()?;
                Some(el)
            })
            .collect()
    }

    fn setup_cell_handlers(host: Rc<RefCell<Host>>, cells: Vec<Cell>) {
        let elements = host.borrow().cells.clone();
        let center_index = host.borrow().center_index;

        for (idx, (el, cell)) in elements.iter().zip(cells).enumerate() {
            // Click - manual ripple
            {
                let host = host.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    if let Err(e) = host.borrow_mut().scheduler.activate_cell(cell) {
                        log::warn!("Cell activation ignored: {}", e);
                    }
                });
                let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }

            // Center pop finished - feed back into the scheduler
            if idx == center_index {
                let host = host.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: AnimationEvent| {
                    if event.animation_name() != POP_ANIMATION {
                        return;
                    }
                    if let Err(e) = host.borrow_mut().scheduler.notify_center_animation_complete() {
                        log::warn!("Center completion ignored: {}", e);
                    }
                });
                let _ = el.add_event_listener_with_callback(
                    "animationend",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
        }
    }

    fn setup_teardown(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            host.borrow_mut().scheduler.teardown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            ripple_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn ripple_loop(host: Rc<RefCell<Host>>, time: f64) {
        {
            let mut h = host.borrow_mut();
            if h.scheduler.is_torn_down() {
                log::info!("Ripple loop stopped");
                return;
            }
            h.frame(time);
        }

        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_grid::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    log::info!("Ripple Grid (native) starting with seed {}...", seed);
    log::info!("Native mode runs a headless session - build for wasm32 to see the grid");

    if let Err(e) = demo::run(seed, 60_000.0) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use ripple_grid::platform::FrameClock;
    use ripple_grid::{Cell, PulseScheduler, RippleConfig, RippleResult, RippleSource};

    /// Simulated frame length (~60 Hz)
    const FRAME_MS: f64 = 16.0;
    /// Chance per frame of a simulated click
    const CLICK_CHANCE: f64 = 0.002;
    /// Chance per frame of a simulated center-pop completion
    const POP_END_CHANCE: f64 = 0.001;

    /// Drive a scheduler with random input over `duration_ms` of simulated time
    pub fn run(seed: u64, duration_ms: f64) -> RippleResult<()> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut scheduler = PulseScheduler::new(RippleConfig::load())?;
        let mut clock = FrameClock::new();
        let grid = *scheduler.grid();

        let mut counts = [0usize; 4];
        let mut time = 0.0;
        clock.tick(time);

        while time < duration_ms {
            time += FRAME_MS;
            scheduler.advance(clock.tick(time));

            if rng.random_bool(CLICK_CHANCE) {
                let cell = Cell::new(rng.random_range(0..grid.rows), rng.random_range(0..grid.cols));
                scheduler.activate_cell(cell)?;
            }
            if rng.random_bool(POP_END_CHANCE) {
                scheduler.notify_center_animation_complete()?;
            }

            for event in scheduler.drain_events() {
                log::info!(
                    "[{:>8.1}ms] ripple #{} from ({}, {}) via {:?}",
                    scheduler.now_ms(),
                    event.generation,
                    event.origin.row,
                    event.origin.col,
                    event.source
                );
                counts[source_index(event.source)] += 1;
            }
        }

        scheduler.teardown();
        let stats = scheduler.timer_stats();
        log::info!(
            "Done: {} startup, {} pulse, {} manual, {} center-complete ripples",
            counts[0],
            counts[1],
            counts[2],
            counts[3]
        );
        log::info!(
            "Timers: {} scheduled, {} canceled, {} fired, {} outstanding",
            stats.scheduled,
            stats.canceled,
            stats.fired,
            stats.outstanding()
        );
        Ok(())
    }

    fn source_index(source: RippleSource) -> usize {
        match source {
            RippleSource::Startup => 0,
            RippleSource::Pulse => 1,
            RippleSource::Manual => 2,
            RippleSource::CenterComplete => 3,
        }
    }
}
