pub mod capacity_service;
pub mod geocoding;
pub mod region_service;
pub mod scheduling_service;
pub mod suggestion_service;

pub use capacity_service::CapacityService;
pub use geocoding::{Geocoder, MapboxGeocoder};
pub use region_service::RegionService;
pub use scheduling_service::SchedulingService;
pub use suggestion_service::SuggestionService;
