// Instruments driven through a Transport.  The 894 is the only real meter so far; the rest of the
// BK Precision 89x family speaks the same command set and should work with the same driver.

pub mod bk894;

// In-process stand-in for a meter, used for dry runs and tests
pub mod mock;
