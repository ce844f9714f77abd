pub mod match_record;
pub mod player_rating;
pub mod processing;
pub mod rating_adjustment_type;
pub mod winner;
