//! Social distribution: concurrent publishing and campaign assembly.

mod campaign;
mod publisher;
mod schedule;

pub use campaign::{
    Campaign, CampaignPlanner, CampaignRequest, CampaignVisualization, TopicFocus,
};
pub use publisher::{PublishResult, Publisher};
pub use schedule::{ScheduledPost, Scheduler};
