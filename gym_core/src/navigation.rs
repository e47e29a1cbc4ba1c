//! Navigation collaborator. The screens only request transitions.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    ExerciseDetail { exercise_id: String },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::ExerciseDetail { exercise_id } => write!(f, "exercise/{}", exercise_id),
        }
    }
}

pub trait Navigator: Send + Sync {
    fn go_back(&self);

    fn navigate_to(&self, route: Route);
}
