pub mod wyze;
