/// Documents per `insert_many` call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
