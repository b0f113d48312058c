pub mod configuration;

pub mod manager {
    pub mod namedobject;
    pub mod managererror;
    pub mod manager;
}

pub mod math {
    pub mod round;
}

pub mod mosaiq {
    pub mod qclerror;
    pub mod siteconfig;
    pub mod connection;
    pub mod qcl;
}

pub mod mudensity {
    pub mod mudensityerror;
    pub mod leafpair;
    pub mod grid;
    pub mod blocked;
    pub mod mudensity;
}

pub mod time {
    pub mod daterange;
}
