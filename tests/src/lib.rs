#![cfg(test)]

mod support;

mod capture {
    mod integration;
}

mod hil {
    mod integration;
}
