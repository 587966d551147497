
// Normalization tests
mod capture;

// Binding and compilation tests
mod analysis;
mod compiler;
