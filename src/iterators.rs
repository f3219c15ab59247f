pub mod grid_position_iterator;
