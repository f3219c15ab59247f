pub mod uniform_grid;
