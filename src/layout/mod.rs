/// Page placement on the digest canvas.
pub mod grid;
