mod deliver;
pub mod remind_now;
pub mod send_due_reminders;
