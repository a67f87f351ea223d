pub mod component_form;
pub mod forms;
pub mod nav;
pub mod palette;
pub mod results_panel;
pub mod scenario_canvas;

pub use component_form::ComponentModal;
pub use forms::{ErrorBanner, FormField};
pub use nav::Protected;
pub use palette::Palette;
pub use results_panel::ResultsPanel;
pub use scenario_canvas::{ScenarioCanvas, auto_arrange};
