pub mod function_map;
