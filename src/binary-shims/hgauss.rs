extern crate hgauss_tasks;

fn main() { hgauss_tasks::entry_points::hgauss() }
