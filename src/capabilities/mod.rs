mod animator;
mod presenter;

pub use self::animator::{Animator, FramePulse, FrameRequest};
pub use self::presenter::{Presenter, PresenterOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppHttp = Http<Event>;
pub type AppAnimator = Animator<Event>;
pub type AppPresenter = Presenter<Event>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub animator: Animator<Event>,
    pub presenter: Presenter<Event>,
}
