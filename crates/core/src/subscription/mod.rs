pub mod accept_subscription;
