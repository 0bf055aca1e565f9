mod contests_test;
mod helpers;
mod participants_test;
mod payments_test;
mod system_test;
mod users_test;
