/// Pure puzzle rules: no terminal, no clock, no I/O.

pub mod countdown;
pub mod epilogue;
pub mod ledger;
pub mod progression;
pub mod puzzle;
pub mod reward;
