mod inmemory;
mod postgres;

pub use inmemory::InMemoryUserRepo;
use notibot_domain::{User, ID};
pub use postgres::PostgresUserRepo;

#[async_trait::async_trait]
pub trait IUserRepo: Send + Sync {
    async fn insert(&self, user: &User) -> anyhow::Result<()>;
    async fn find(&self, user_id: &ID) -> Option<User>;
}

#[cfg(test)]
mod tests {
    use crate::NotibotContext;
    use notibot_domain::User;

    #[tokio::test]
    async fn test_find_user() {
        let ctx = NotibotContext::create_inmemory();

        let user = User::new("max-42");
        assert!(ctx.repos.users.find(&user.id).await.is_none());
        ctx.repos.users.insert(&user).await.expect("To insert user");
        let found = ctx.repos.users.find(&user.id).await.expect("To find user");
        assert_eq!(found.max_user_id, "max-42");
    }
}
