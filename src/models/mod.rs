pub mod episode;
pub mod series;

pub use episode::EpisodeRecord;
pub use series::SeriesRecord;
