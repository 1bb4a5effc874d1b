pub mod gradient_check;
