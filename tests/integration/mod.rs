mod helpers;

mod test_cli_surface;
mod test_create_patch;
mod test_init_project;
mod test_prepare_release;
