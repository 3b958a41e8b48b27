//! Drawing surface collaborator and frame rendering.

use crate::sizing::{place, Anchor, FitMode, Placement, Size};

/// A fixed-size viewport that can clear itself and draw images.
///
/// The player reads [`size`](Self::size) on every frame and only resizes the
/// surface when configured to (explicit width/height, or size-to-first-image).
/// Drawing outside the viewport must be clipped by the implementation.
pub trait Surface {
    /// Image handle this surface can draw
    type Image;

    /// Current viewport size in pixels.
    fn size(&self) -> Size;

    /// Resize the viewport.
    fn set_size(&mut self, size: Size);

    /// Clear the whole viewport.
    fn clear(&mut self);

    /// Draw `image` scaled into `placement`.
    fn draw_image(&mut self, image: &Self::Image, placement: &Placement);
}

/// Clear `surface` and draw `image` object-fitted into it.
///
/// Returns the placement used, or `None` (after clearing) when either size
/// is degenerate and nothing could be drawn.
pub fn draw_fitted<S: Surface>(surface: &mut S, image: &S::Image, natural: Size, fit: FitMode, anchor: Anchor) -> Option<Placement> {
    surface.clear();
    let placement = place(natural, surface.size(), fit, anchor)?;
    surface.draw_image(image, &placement);
    Some(placement)
}

/// A draw call recorded by [`RecordingSurface`].
///
/// This is a platform-agnostic representation of what was drawn, useful for
/// tests and for hosts that replay commands onto their own backend.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand<I> {
    /// Viewport cleared
    Clear,
    /// Image drawn at a placement
    Image { image: I, placement: Placement },
}

/// Surface that records every command instead of drawing.
#[derive(Clone, Debug)]
pub struct RecordingSurface<I> {
    size: Size,
    commands: Vec<DrawCommand<I>>,
}

impl<I: Clone> RecordingSurface<I> {
    /// Create a surface with the given viewport size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            commands: Vec::new(),
        }
    }

    /// All commands so far, oldest first.
    #[inline]
    pub fn commands(&self) -> &[DrawCommand<I>] {
        &self.commands
    }

    /// Images drawn so far, with their placements.
    pub fn drawn(&self) -> Vec<(&I, &Placement)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Image { image, placement } => Some((image, placement)),
                DrawCommand::Clear => None,
            })
            .collect()
    }

    /// Forget recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand<I>> {
        std::mem::take(&mut self.commands)
    }
}

impl<I: Clone> Surface for RecordingSurface<I> {
    type Image = I;

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_image(&mut self, image: &I, placement: &Placement) {
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            placement: *placement,
        });
    }
}

/// Web-specific rendering implementation.
///
/// Wires a [`crate::Player`] to an HTML canvas, `<img>` elements for
/// loading and `window.setTimeout` for ticks.
#[cfg(feature = "web")]
pub mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::{Rc, Weak};
    use std::time::Duration;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    use super::*;
    use crate::loader::{CrossOrigin, ImageLoader, LoadError};
    use crate::timer::{Timer, TimerId};
    use crate::{FrameSource, ImageAsset, Player, PlayerConfig};

    /// A player bound to a canvas.
    pub type WebPlayer = Player<CanvasSurface, WindowTimer>;

    /// Canvas-backed [`Surface`].
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        /// Wrap a canvas, acquiring its 2D context.
        pub fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
            let ctx = canvas
                .get_context("2d")
                .map_err(|_| "Failed to get 2d context")?
                .ok_or("No 2d context available")?
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(|_| "Failed to cast to CanvasRenderingContext2d")?;
            Ok(Self { canvas, ctx })
        }

        /// The underlying canvas element.
        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }
    }

    impl Surface for CanvasSurface {
        type Image = HtmlImageElement;

        fn size(&self) -> Size {
            Size::from((self.canvas.width(), self.canvas.height()))
        }

        fn set_size(&mut self, size: Size) {
            self.canvas.set_width(size.width.round() as u32);
            self.canvas.set_height(size.height.round() as u32);
        }

        fn clear(&mut self) {
            let size = self.size();
            self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        }

        fn draw_image(&mut self, image: &HtmlImageElement, placement: &Placement) {
            if self
                .ctx
                .draw_image_with_html_image_element_and_dw_and_dh(image, placement.x, placement.y, placement.width, placement.height)
                .is_err()
            {
                log::warn!("failed to draw {}", image.src());
            }
        }
    }

    type Callback = Closure<dyn FnMut()>;

    /// [`Timer`] backed by `window.setTimeout`.
    ///
    /// Expired ids are dispatched to the player set with [`bind`](Self::bind).
    /// Each armed timer keeps its callback until it fires or is cancelled.
    #[derive(Default)]
    pub struct WindowTimer {
        next_id: u64,
        handles: Rc<RefCell<HashMap<TimerId, (i32, Callback)>>>,
        target: Weak<RefCell<WebPlayer>>,
    }

    impl WindowTimer {
        /// Create an unbound timer.
        pub fn new() -> Self {
            Self::default()
        }

        /// Route expirations to `player`.
        pub fn bind(&mut self, player: Weak<RefCell<WebPlayer>>) {
            self.target = player;
        }
    }

    impl Timer for WindowTimer {
        fn arm(&mut self, delay: Duration) -> TimerId {
            let id = TimerId(self.next_id);
            self.next_id += 1;

            let Some(window) = web_sys::window() else {
                log::warn!("no window available, timer {id:?} will never fire");
                return id;
            };

            let target = self.target.clone();
            let handles = Rc::clone(&self.handles);
            let callback: Callback = Closure::once(move || {
                // Freed once this invocation returns
                let _fired = handles.borrow_mut().remove(&id);
                if let Some(player) = target.upgrade() {
                    player.borrow_mut().on_timer(id);
                }
            });

            let ms = delay.as_millis().min(i32::MAX as u128) as i32;
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), ms) {
                Ok(handle) => {
                    self.handles.borrow_mut().insert(id, (handle, callback));
                }
                Err(_) => log::warn!("setTimeout failed for timer {id:?}"),
            }
            id
        }

        fn cancel(&mut self, id: TimerId) {
            let cancelled = self.handles.borrow_mut().remove(&id);
            if let Some((handle, _callback)) = cancelled {
                if let Some(window) = web_sys::window() {
                    window.clear_timeout_with_handle(handle);
                }
            }
        }
    }

    /// [`ImageLoader`] creating `<img>` elements.
    pub struct WebImageLoader {
        target: Weak<RefCell<WebPlayer>>,
    }

    impl WebImageLoader {
        /// Deliver completions to `player`; they are dropped once it is gone.
        pub fn new(player: Weak<RefCell<WebPlayer>>) -> Self {
            Self { target: player }
        }
    }

    impl ImageLoader for WebImageLoader {
        type Image = HtmlImageElement;

        fn request(&mut self, index: usize, id: &str, cross_origin: CrossOrigin) {
            // Called while the player is borrowed, so failures here can only be logged.
            let Ok(img) = HtmlImageElement::new() else {
                log::warn!("could not create <img> for frame {index} (`{id}`)");
                return;
            };
            img.set_cross_origin(cross_origin.attribute());

            // Whichever handler fires releases both
            let handlers: Rc<RefCell<Option<(Callback, Callback)>>> = Rc::default();

            let target = self.target.clone();
            let loaded = img.clone();
            let name = id.to_string();
            let slot = Rc::clone(&handlers);
            let onload: Callback = Closure::once(move || {
                let _handlers = slot.borrow_mut().take();
                loaded.set_onload(None);
                loaded.set_onerror(None);
                if let Some(player) = target.upgrade() {
                    let asset = ImageAsset::new(name, loaded.natural_width(), loaded.natural_height(), loaded);
                    player.borrow_mut().on_image_loaded(index, asset);
                }
            });

            let target = self.target.clone();
            let failed = img.clone();
            let name = id.to_string();
            let slot = Rc::clone(&handlers);
            let onerror: Callback = Closure::once(move || {
                let _handlers = slot.borrow_mut().take();
                failed.set_onload(None);
                failed.set_onerror(None);
                if let Some(player) = target.upgrade() {
                    player
                        .borrow_mut()
                        .on_image_failed(index, LoadError::Failed(format!("could not load `{name}`")));
                }
            });

            img.set_onload(Some(onload.as_ref().unchecked_ref()));
            img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            *handlers.borrow_mut() = Some((onload, onerror));
            img.set_src(id);
        }
    }

    /// Build a player on `canvas` and start loading its frames.
    ///
    /// Observers run while the returned cell is mutably borrowed, so they
    /// must not borrow it again. Steer playback from an observer through
    /// [`Player::command_queue`] instead.
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// use flipbook_core::{PlayerConfig, SequenceDescriptor};
    /// use flipbook_core::render::web::mount;
    ///
    /// let canvas: web_sys::HtmlCanvasElement = // ... get canvas element
    /// let config = PlayerConfig { play_on_load: true, loop_playback: true, ..Default::default() };
    /// let player = mount(canvas, SequenceDescriptor::new("img/0001.jpg", "img/0120.jpg"), config)?;
    /// let queue = player.borrow().command_queue();
    /// player.borrow_mut().subscribe(move |event: &flipbook_core::PlayerEvent| {
    ///     if *event == flipbook_core::PlayerEvent::Looped {
    ///         queue.push(flipbook_core::Command::Pause);
    ///     }
    /// });
    /// ```
    pub fn mount(canvas: HtmlCanvasElement, source: impl Into<FrameSource>, config: PlayerConfig) -> Result<Rc<RefCell<WebPlayer>>, String> {
        let surface = CanvasSurface::new(canvas)?;
        let player = Rc::new(RefCell::new(Player::new(surface, WindowTimer::new(), source, config)));
        player.borrow_mut().timer_mut().bind(Rc::downgrade(&player));

        let mut loader = WebImageLoader::new(Rc::downgrade(&player));
        player.borrow_mut().load(&mut loader);
        Ok(player)
    }
}
