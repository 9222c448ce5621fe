//! Database Models

pub mod admin;
pub mod campaign;
pub mod donation;
pub mod serde_thing;

pub use admin::{AdminUser, AdminUserCreate};
pub use campaign::{Campaign, CampaignCreate, CampaignUpdate};
pub use donation::{
    Donation, DonationCreate, DonationStatus, ManualDonationCreate, PaymentMethod,
};
