pub mod account;
pub mod company;
pub mod engagement;
pub mod volunteer;

pub use account::{Account, ActorKind, Credentials};
pub use company::{Company, CompanyChanges, CompanyProfile, CompanyView};
pub use engagement::{Engagement, EngagementStatus};
pub use volunteer::{Volunteer, VolunteerChanges, VolunteerProfile, VolunteerView};
