mod clock;
mod operation;
