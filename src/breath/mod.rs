pub mod breath;
pub mod pacer;
