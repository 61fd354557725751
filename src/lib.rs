use std::sync::{Arc, Mutex};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};
use instant::Instant;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use once_cell::sync::OnceCell;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::future_to_promise;
#[cfg(target_arch = "wasm32")]
use js_sys::Promise;
#[cfg(target_arch = "wasm32")]
use winit::event_loop::EventLoopProxy;

mod app_state;
mod camera;
mod color;
pub mod config;
mod debounce;
pub mod host;
mod models;
pub mod scene;
pub mod theme;
mod timing;
mod ui_events;

pub use config::{BackdropConfig, MOUNT_ID};
pub use theme::Palette;

use app_state::State;
use debounce::Debouncer;
use ui_events::UserCommand;

#[cfg(target_arch = "wasm32")]
static WASM_API_INSTANCE: OnceCell<WasmApi> = OnceCell::new();

#[cfg(target_arch = "wasm32")]
static WASM_READY_FLUME_CHANNEL: OnceCell<(flume::Sender<()>, flume::Receiver<()>)> = OnceCell::new();

struct App {
    backdrop_config: BackdropConfig,
    palette: Palette,
    node_count: usize, // Sampled once from the viewport at startup
    window: Option<Arc<Window>>,
    state: Arc<Mutex<Option<State>>>, // Filled asynchronously on wasm
    pending_resize: Debouncer<PhysicalSize<u32>>,
    #[cfg(not(target_arch = "wasm32"))]
    window_size: winit::dpi::LogicalSize<f64>,
    #[cfg(target_arch = "wasm32")]
    proxy: EventLoopProxy<UserCommand>,
    #[cfg(target_arch = "wasm32")]
    mount: web_sys::Element,
    #[cfg(target_arch = "wasm32")]
    canvas: Option<web_sys::HtmlCanvasElement>,
    #[cfg(target_arch = "wasm32")]
    viewport_listener: Option<Closure<dyn FnMut()>>,
}

impl App {
    #[cfg(not(target_arch = "wasm32"))]
    fn new(
        backdrop_config: BackdropConfig,
        palette: Palette,
        window_size: winit::dpi::LogicalSize<f64>,
    ) -> Self {
        let node_count =
            scene::field::node_count(host::viewport_width(window_size.width as f32), &backdrop_config);
        Self {
            pending_resize: Debouncer::new(backdrop_config.resize_debounce()),
            node_count,
            backdrop_config,
            palette,
            window: None,
            state: Arc::new(Mutex::new(None)),
            window_size,
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn new(
        backdrop_config: BackdropConfig,
        palette: Palette,
        event_loop: &EventLoop<UserCommand>,
        mount: web_sys::Element,
    ) -> Self {
        let app_proxy = event_loop.create_proxy();

        let wasm_api_instance = WasmApi { proxy: app_proxy.clone() };
        if WASM_API_INSTANCE.set(wasm_api_instance).is_err() {
            log::warn!("WASM_API_INSTANCE was already set. This should only happen once.");
        }

        let logical_width = mount.client_width() as f32;
        let node_count =
            scene::field::node_count(host::viewport_width(logical_width), &backdrop_config);
        Self {
            pending_resize: Debouncer::new(backdrop_config.resize_debounce()),
            node_count,
            backdrop_config,
            palette,
            window: None,
            state: Arc::new(Mutex::new(None)),
            proxy: app_proxy,
            mount,
            canvas: None,
            viewport_listener: None,
        }
    }

    /// Runs one frame: applies a settled resize, steps the field, draws,
    /// and schedules the next frame.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Ok(mut state_guard) = self.state.lock() else {
            log::error!("Backdrop state lock poisoned, stopping.");
            event_loop.exit();
            return;
        };
        let Some(state) = state_guard.as_mut() else {
            // Not initialized yet; StateInitialized restarts the loop.
            return;
        };

        let now = Instant::now();
        if let Some(size) = self.pending_resize.poll(now) {
            apply_resize(state, &window, size);
        }

        state.update(now);
        match state.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, stopping backdrop.");
                event_loop.exit();
                return;
            }
            Err(e) => log::error!("Dropped frame: {:?}", e),
        }

        window.request_redraw();
    }
}

/// Hands the measured surface to the state, which regenerates nodes.
fn apply_resize(state: &mut State, window: &Window, size: PhysicalSize<u32>) {
    state.resize(size.width, size.height, window.scale_factor());
}

impl ApplicationHandler<UserCommand> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut window_attributes = Window::default_attributes()
            .with_title("backdrop")
            .with_transparent(true);

        #[cfg(not(target_arch = "wasm32"))]
        {
            window_attributes = window_attributes.with_inner_size(self.window_size);
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = match host::create_canvas(&self.mount) {
                Ok(canvas) => canvas,
                Err(e) => {
                    log::error!("Failed to create backdrop canvas: {:?}", e);
                    event_loop.exit();
                    return;
                }
            };
            window_attributes = window_attributes
                .with_canvas(Some(canvas.clone()))
                .with_prevent_default(false)
                .with_focusable(false);

            // winit only observes the canvas; a mount that collapses or
            // regains its size needs the canvas refitted by hand.
            let mount = self.mount.clone();
            let canvas_for_listener = canvas.clone();
            match host::watch_viewport(move || {
                if let Err(e) = host::fit_canvas(&mount, &canvas_for_listener) {
                    log::warn!("Failed to refit backdrop canvas: {:?}", e);
                }
            }) {
                Ok(listener) => self.viewport_listener = Some(listener),
                Err(e) => log::warn!("Viewport resize listener not attached: {:?}", e),
            }
            self.canvas = Some(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let backdrop_config = self.backdrop_config.clone();
            match pollster::block_on(State::new(
                window.clone(),
                backdrop_config,
                self.palette,
                self.node_count,
            )) {
                Ok(mut state) => {
                    // The first measurement is immediate, later ones are debounced.
                    apply_resize(&mut state, &window, window.inner_size());
                    if let Ok(mut state_guard) = self.state.lock() {
                        state_guard.replace(state);
                    }
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to initialize renderer: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let state_arc_for_spawn = self.state.clone();
            let window_for_state_new = window.clone();
            let proxy_for_init_notification = self.proxy.clone();
            let backdrop_config = self.backdrop_config.clone();
            let palette = self.palette;
            let node_count = self.node_count;

            wasm_bindgen_futures::spawn_local(async move {
                match State::new(window_for_state_new.clone(), backdrop_config, palette, node_count).await {
                    Ok(mut state_instance) => {
                        let initial_size = window_for_state_new.inner_size();
                        apply_resize(&mut state_instance, &window_for_state_new, initial_size);

                        match state_arc_for_spawn.lock() {
                            Ok(mut app_state_guard) => {
                                app_state_guard.replace(state_instance);
                            }
                            Err(_) => {
                                log::error!("Backdrop state lock poisoned during init.");
                                return;
                            }
                        }
                        log::info!("Backdrop renderer ready.");
                        if proxy_for_init_notification.send_event(UserCommand::StateInitialized).is_err() {
                            log::error!("Failed to send StateInitialized event.");
                        }
                    }
                    Err(e) => log::error!("Failed to initialize renderer: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserCommand) {
        match event {
            UserCommand::StateInitialized => {
                #[cfg(target_arch = "wasm32")]
                if let Some((sender, _)) = WASM_READY_FLUME_CHANNEL.get() {
                    if let Err(e) = sender.send(()) {
                        log::error!("Failed to send WASM ready signal: {:?}", e);
                    }
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            UserCommand::Shutdown => {
                log::info!("Backdrop shutdown requested.");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.pending_resize.signal(size, Instant::now()),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.pending_resize.cancel();
        if let Ok(mut state_guard) = self.state.lock() {
            if let Some(state) = state_guard.take() {
                log::info!("Backdrop stopped at {} fps.", state.current_fps());
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            if let Some(listener) = self.viewport_listener.take() {
                host::unwatch_viewport(&listener);
            }
            if let Some(canvas) = self.canvas.take() {
                host::remove_canvas(&canvas);
            }
        }
        self.window = None;
    }
}

fn init_logging() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_error_panic_hook::set_once();
            if console_log::init_with_level(log::Level::Info).is_err() {
                log::debug!("Logger already initialized.");
            }
        } else {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("info"),
            )
            .try_init();
        }
    }
}

/// Opens a preview window and runs the backdrop until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(
    backdrop_config: BackdropConfig,
    palette: Palette,
    window_size: winit::dpi::LogicalSize<f64>,
) -> anyhow::Result<()> {
    init_logging();
    backdrop_config.validate()?;
    log::info!("Starting backdrop preview with {:?} palette.", palette);

    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(backdrop_config, palette, window_size);
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Mounts the backdrop into `#vertexBg`. Pages without that element are
/// left untouched.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    init_logging();

    let Some(mount) = host::find_mount(MOUNT_ID) else {
        log::debug!("No #{} element on this page, backdrop disabled.", MOUNT_ID);
        return Ok(());
    };

    let backdrop_config = host::read_config(&mount);
    let palette = host::detect_palette(&backdrop_config.dark_class);
    log::info!("Mounting backdrop into #{} with {:?} palette.", MOUNT_ID, palette);

    WASM_READY_FLUME_CHANNEL
        .set(flume::unbounded())
        .map_err(|_| JsValue::from_str("Backdrop is already running."))?;

    let event_loop = EventLoop::with_user_event()
        .build()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let app = App::new(backdrop_config, palette, &event_loop, mount);

    use winit::platform::web::EventLoopExtWebSys;
    event_loop.spawn_app(app);

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct WasmApi {
    proxy: EventLoopProxy<UserCommand>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl WasmApi {
    /// Stops the frame loop, detaches listeners and removes the canvas.
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.proxy
            .send_event(UserCommand::Shutdown)
            .map_err(|_| JsValue::from_str("Backdrop event loop has already stopped."))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmApi)]
pub fn get_wasm_api() -> Result<WasmApi, JsValue> {
    WASM_API_INSTANCE.get()
        .cloned()
        .ok_or_else(|| JsValue::from_str("Backdrop is not mounted on this page."))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = getWasmReadyPromise)]
pub fn get_wasm_ready_promise() -> Result<Promise, JsValue> {
    let (_, receiver) = WASM_READY_FLUME_CHANNEL.get()
        .ok_or_else(|| JsValue::from_str("Backdrop is not mounted on this page."))?;
    let receiver = receiver.clone();

    Ok(future_to_promise(async move {
        receiver
            .recv_async()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsValue::NULL)
    }))
}
