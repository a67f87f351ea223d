mod component;
pub mod layout;
mod render;
mod state;

pub use component::{DRAG_KIND, ScenarioCanvas};
pub use layout::auto_arrange;
