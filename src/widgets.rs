mod desk_figure;
mod height_readout;

pub use desk_figure::DeskFigure;
pub use height_readout::HeightReadout;
