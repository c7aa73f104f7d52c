mod helpers;
mod interactions;
mod mocks;
