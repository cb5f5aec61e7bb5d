//! HTTP routes for Lyceum

pub mod exam;
pub mod form;
pub mod health;
pub mod knowledge;
pub mod render;
pub mod social;

pub use exam::{
    exam_result, exam_system_index, exam_system_submit, take_exam_answer, take_exam_show,
    SESSION_COOKIE,
};
pub use health::{health_check, version_info};
pub use knowledge::{
    branch, explore_system, home, knowledge_base_index, knowledge_base_submit,
    learn_system_index, learn_system_submit, post_research, publish_research, view_research,
};
pub use social::{placeholder, social_index, social_submit};
