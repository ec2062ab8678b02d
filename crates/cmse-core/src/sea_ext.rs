use sea_orm::{
    EntityTrait, Order, QueryOrder, QuerySelect, Select,
    sea_query::{Func, SimpleExpr},
};

/// Random sampling for sea-orm selects.
pub trait RandomSample {
    /// `ORDER BY RANDOM() LIMIT n`.
    fn random_sample(self, n: u64) -> Self;
}

impl<E> RandomSample for Select<E>
where
    E: EntityTrait,
{
    fn random_sample(mut self, n: u64) -> Self {
        QueryOrder::query(&mut self)
            .order_by_expr(SimpleExpr::FunctionCall(Func::random()), Order::Asc);
        self.limit(n)
    }
}
