mod job_schedulers;
mod reminder;
mod shared;
mod subscription;

pub use job_schedulers::{ReminderScheduler, SchedulerError};
pub use reminder::remind_now::{
    RemindNowResponse, RemindNowUseCase, UseCaseError as RemindNowError,
};
pub use reminder::send_due_reminders::{SendDueRemindersUseCase, SweepError, SweepReport};
pub use shared::usecase::{execute, UseCase};
pub use subscription::accept_subscription::{
    AcceptSubscriptionUseCase, UseCaseError as AcceptSubscriptionError,
};
