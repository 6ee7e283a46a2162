mod rig;

mod bus_faults;
mod full_stack;
mod spindle_api;
